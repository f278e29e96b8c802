use beacon_common::{PinIdentity, PinType};

#[derive(clap::Args, Debug, Clone)]
pub struct PinArgs {
    #[arg(long)]
    pub owner: String,
    #[arg(long)]
    pub dashboard: i32,
    #[arg(long, default_value = "0")]
    pub device: i32,
    #[arg(long, help = "d, a, v or digital, analog, virtual")]
    pub pin_type: PinType,
    #[arg(long)]
    pub pin: i32,
}

impl PinArgs {
    pub fn identity(&self) -> PinIdentity {
        PinIdentity::new(
            self.owner.clone(),
            self.dashboard,
            self.device,
            self.pin_type,
            self.pin,
        )
    }
}

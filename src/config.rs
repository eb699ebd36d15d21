use std::env;
use std::path::PathBuf;
use anyhow::{Result, ensure};
use log::{info, warn};

const DEFAULT_STAFF_CHAT_ID: i64 = 7309681026;
const DEFAULT_MENU_URL: &str = "https://v0-index-sepia.vercel.app";
const DEFAULT_PRINT_URL: &str = "https://9c7ad82f72b9.ngrok-free.app/order";
const DEFAULT_RESTART_MINUTES: u64 = 120;
const DEFAULT_HEALTH_PORT: u16 = 8080;

pub struct EnvConfig {
    pub bot_token: String,
    pub staff_chat_id: i64,
    pub menu_url: String,
    pub print_url: String,
    pub manager_contact: String,
    pub restart_minutes: u64,
    pub health_port: u16,
    pub state_file: Option<PathBuf>,
}

impl EnvConfig {
    pub fn load() -> Self {
        dotenvy::dotenv().ok();

        Self {
            bot_token: env::var("API_TOKEN").unwrap_or_default(),

            staff_chat_id: env::var("STAFF_CHAT_ID")
                .ok()
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(DEFAULT_STAFF_CHAT_ID),

            menu_url: env::var("MENU_URL")
                .unwrap_or_else(|_| DEFAULT_MENU_URL.to_string()),

            print_url: env::var("PRINT_URL")
                .unwrap_or_else(|_| DEFAULT_PRINT_URL.to_string()),

            manager_contact: env::var("MANAGER_CONTACT").unwrap_or_default(),

            restart_minutes: env::var("RESTART_MINUTES")
                .ok()
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(DEFAULT_RESTART_MINUTES),

            health_port: env::var("HEALTH_PORT")
                .ok()
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(DEFAULT_HEALTH_PORT),

            state_file: env::var("STATE_FILE").ok().map(PathBuf::from),
        }
    }

    pub fn validate(self) -> Result<Self> {
        info!("--- Checking env variables ---");
        info!("👥 Staff chat: {}", self.staff_chat_id);
        info!("📋 Menu URL: {}", self.menu_url);
        info!("🖨 Print URL: {}", self.print_url);
        info!("♻️ Restart after: {} min", self.restart_minutes);
        info!("❤️ Health port: {}", self.health_port);

        ensure!(
            !self.bot_token.is_empty(),
            "Critical Error: API_TOKEN not set!"
        );

        match &self.state_file {
            Some(p) => info!("💾 State file: {:?}", p),
            None => warn!("⚠️ STATE_FILE not set, reply links will not survive restart"),
        }

        Ok(self)
    }
}

use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use teloxide::dispatching::Dispatcher;
use teloxide::dptree;
use tokio_util::sync::CancellationToken;

extern crate pretty_env_logger;
#[macro_use]
extern crate log;

mod bot;
mod config;
mod dispatch;
mod health;
mod models;
mod order;
mod print;
mod replies;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    pretty_env_logger::init();

    let cancel_token = CancellationToken::new();

    info!("🚀 Starting Smoke Factory BBQ order bot.");

    let env = config::EnvConfig::load()
        .validate()
        .context("Error checking env variables.")?;

    let bot_token = env.bot_token.clone();
    let health_port = env.health_port;
    let restart_minutes = env.restart_minutes;

    let app_config = Arc::new(models::AppConfig::new(env).context("Error building app state.")?);

    tokio::spawn(async move {
        if let Err(e) = health::serve(health_port).await {
            error!("Liveness endpoint failed: {:#}", e);
        }
    });

    spawn_restart_timer(restart_minutes, cancel_token.clone());

    {
        // Ctrl+C или SIGTERM от Docker/OS.
        let token = cancel_token.clone();
        tokio::spawn(async move {
            tokio::signal::ctrl_c()
                .await
                .expect("Failed to listen for ctrl+c");
            info!("Received SIGTERM");
            token.cancel();
        });
    }

    info!("✅ Run Dispatcher...");

    let mut dispatcher = Dispatcher::builder(bot::init(bot_token), bot::schema())
        .dependencies(dptree::deps![app_config.clone()])
        .enable_ctrlc_handler()
        .build();

    tokio::select! {
        _ = dispatcher.dispatch() => info!("Bot task completed successfully."),
        _ = cancel_token.cancelled() => info!("Bot task was canceled."),
    }

    info!("Graceful Shutdown...");

    match app_config.reply_links.persist() {
        Ok(()) => info!("💾 Сохранено связок ответов: {}", app_config.reply_links.len()),
        Err(e) => warn!("Таблица связок не сохранилась при выходе: {:#}", e),
    }

    Ok(())
}

/// Плановый перезапуск. Сам процесс себя не пересоздаёт: по таймеру
/// гасим токен, чисто выходим, а поднимает нас супервизор
/// (Docker restart policy / systemd). Интервал 0 выключает таймер.
fn spawn_restart_timer(minutes: u64, cancel_token: CancellationToken) {
    if minutes == 0 {
        info!("♻️ Restart timer disabled.");
        return;
    }

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(minutes * 60)).await;
        info!("♻️ Scheduled restart after {} min, shutting down for supervisor.", minutes);
        cancel_token.cancel();
    });
}

use std::path::Path;

use tokio::process::Command;

use zmingz_worker::WorkerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = WorkerConfig::from_env();

    println!(
        "zmingz-selfcheck: starting with work_dir={}",
        config.work_dir.display()
    );
    ensure_workdir(&config.work_dir).await?;
    ensure_ffmpeg(&config).await?;

    println!("zmingz-selfcheck: ok");
    Ok(())
}

async fn ensure_workdir<P: AsRef<Path>>(path: P) -> anyhow::Result<()> {
    let path = path.as_ref();
    tokio::fs::create_dir_all(path).await?;
    Ok(())
}

async fn ensure_ffmpeg(config: &WorkerConfig) -> anyhow::Result<()> {
    let engine = config
        .engine()
        .map_err(|e| anyhow::anyhow!("ffmpeg not available: {}", e))?;

    let output = Command::new(engine.binary())
        .arg("-version")
        .output()
        .await
        .map_err(|e| anyhow::anyhow!("ffmpeg not available: {}", e))?;

    if !output.status.success() {
        return Err(anyhow::anyhow!(
            "ffmpeg -version failed: {:?}",
            output.status
        ));
    }
    Ok(())
}

use std::path::Path;

use emosync_ml_client::MlClient;
use emosync_worker::WorkerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = WorkerConfig::from_env();

    println!(
        "emosync-selfcheck: starting with input_dir={} output_dir={}",
        config.input_dir.display(),
        config.output_dir.display()
    );
    ensure_input_dir(&config.input_dir).await?;
    ensure_output_dir(&config.output_dir).await?;
    ensure_ml_service().await?;
    ensure_sequence_model(config.fusion.smoothing.model_path.as_deref())?;

    println!("emosync-selfcheck: ok");
    Ok(())
}

async fn ensure_input_dir(path: &Path) -> anyhow::Result<()> {
    if !tokio::fs::try_exists(path).await? {
        return Err(anyhow::anyhow!("input dir {} does not exist", path.display()));
    }
    Ok(())
}

async fn ensure_output_dir(path: &Path) -> anyhow::Result<()> {
    tokio::fs::create_dir_all(path).await?;
    let probe = path.join(".selfcheck");
    tokio::fs::write(&probe, b"ok")
        .await
        .map_err(|e| anyhow::anyhow!("output dir {} not writable: {}", path.display(), e))?;
    tokio::fs::remove_file(&probe).await?;
    Ok(())
}

async fn ensure_ml_service() -> anyhow::Result<()> {
    let client = MlClient::from_env()?;
    if !client.health_check().await? {
        return Err(anyhow::anyhow!(
            "ML service at {} is not healthy",
            client.config().base_url
        ));
    }
    Ok(())
}

fn ensure_sequence_model(model_path: Option<&Path>) -> anyhow::Result<()> {
    match model_path {
        Some(path) if !path.exists() => Err(anyhow::anyhow!(
            "sequence model {} not found",
            path.display()
        )),
        Some(path) => {
            println!("emosync-selfcheck: sequence model {}", path.display());
            Ok(())
        }
        None => {
            println!("emosync-selfcheck: no sequence model configured, sequence-model smoothing unavailable");
            Ok(())
        }
    }
}

use anyhow::Result;
use essay_grader::utils::logging;
use essay_grader::{App, Config};

#[tokio::main]
async fn main() -> Result<()> {
    // 初始化日志
    logging::init();

    // 加载配置
    let config = Config::load()?;

    // 初始化并运行应用
    let summary = App::initialize(config).await?.run().await?;

    if let Some(failure) = summary.failure {
        anyhow::bail!("{}", failure);
    }

    Ok(())
}

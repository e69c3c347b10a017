use anyhow::Result;
use batch_answer::{logger, App, Config};
use tracing::warn;

#[tokio::main]
async fn main() -> Result<()> {
    // 初始化日志
    logger::init();

    // 加载配置
    let config = Config::load()?;

    let app = App::initialize(config).await?;

    // Ctrl-C 只停止派发，已派发的题目照常完成并写出
    let cancel = app.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("⏹️ 收到 Ctrl-C，等待在途请求完成后写出结果...");
            cancel.cancel();
        }
    });

    app.run().await?;

    Ok(())
}

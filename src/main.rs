use prodcons_monitor::app;

#[tokio::main]
async fn main() {
    app::main().await;
}

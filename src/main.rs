#[tokio::main]
async fn main() -> anyhow::Result<()> {
    shopwatch_lib::run().await
}

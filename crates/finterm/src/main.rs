#[tokio::main]
async fn main() -> anyhow::Result<()> {
    finterm_lib::main().await
}

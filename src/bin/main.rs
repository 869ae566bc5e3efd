#[tokio::main]
async fn main() -> rdfs_studio::Result<()> {
    rdfs_studio::cli::main().await
}

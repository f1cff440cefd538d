use env_logger::Env;
use schemaport::config::MigrationConfig;
use schemaport::SchemaCopier;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let config = MigrationConfig::from_env()?;
    let copier = SchemaCopier::connect(&config).await?;
    let report = copier.copy_schema().await?;

    log::info!(
        "Created {} tables, rewrote {} column types",
        report.tables_created,
        report.columns_rewritten
    );
    println!("All done!");

    Ok(())
}

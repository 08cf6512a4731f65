use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = vista_api::Args::parse();

	vista_api::run(args).await
}

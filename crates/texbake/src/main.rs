use anyhow::Result;
use texbake::cli::{run, CliArgs};
use texbake::BakeResult;

fn main() -> Result<()> {
    let _ = env_logger::try_init();

    let args = CliArgs::parse_from_env()?;
    let results = run(&args)?;
    for result in &results {
        println!("{result}");
        for outcome in result.skipped().chain(result.failed()) {
            println!("  {}: {:?}", outcome.label, outcome.status);
        }
    }

    if results.iter().any(BakeResult::has_failures) {
        std::process::exit(1);
    }
    Ok(())
}

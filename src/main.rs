use anyhow::Result;
use ticklog::cli;

fn main() -> Result<()> {
    let code = match cli::process_cli() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("ticklog: error: {e:#}");
            1
        }
    };
    log::logger().flush();

    if code != 0 {
        // Nothing holds resources that need dropping at this point.
        std::process::exit(code);
    }
    Ok(())
}

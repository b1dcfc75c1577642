use anyhow::Result;
use two_knights::cli::Console;

fn main() -> Result<()> {
    Console::new().run()
}

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use folio_editor::{ActiveWhen, CommandRegistry};

#[derive(Debug, Args)]
pub struct ListArgs {
    /// Print names only
    #[arg(short, long)]
    pub quiet: bool,
}

pub fn list(args: ListArgs) -> Result<()> {
    let registry = CommandRegistry::default_registry();

    for command in registry.iter() {
        if args.quiet {
            println!("{}", command.name);
            continue;
        }
        let active = match &command.active {
            ActiveWhen::Never => "",
            ActiveWhen::Contains(_) => "node",
            ActiveWhen::Format(_) => "format",
        };
        println!(
            "  {:<18} {:<26} {}",
            command.name.bright_blue(),
            command.label,
            active.dimmed()
        );
    }
    Ok(())
}

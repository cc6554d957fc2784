use crate::cli::args::{BatchCommand, Cli, Command};
use crate::exit_codes;

pub async fn dispatch(cli: Cli) -> anyhow::Result<i32> {
    match cli.cmd {
        Command::Judge(args) => super::judge::run(args).await,
        Command::Batch(args) => match args.cmd {
            BatchCommand::Submit(args) => super::batch::submit(args).await,
            BatchCommand::Status(args) => super::batch::status(args).await,
            BatchCommand::Parse(args) => super::batch::parse(args),
            BatchCommand::Repair(args) => super::batch::repair(args).await,
        },
        Command::Analyze(args) => super::analyze::run(args),
        Command::Ablate(args) => super::ablate::run(args),
        Command::Version => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            Ok(exit_codes::SUCCESS)
        }
    }
}

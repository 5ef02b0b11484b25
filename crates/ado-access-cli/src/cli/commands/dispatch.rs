use super::super::args::*;
use crate::exit_codes::EXIT_SUCCESS;

pub async fn dispatch(cli: Cli) -> anyhow::Result<i32> {
    let global = cli.global;
    match cli.cmd {
        Command::Identity(args) => super::identity::run(args.cmd, &global).await,
        Command::Subject(args) => super::subject::run(args.cmd, &global).await,
        Command::Permission(args) => super::permission::run(args.cmd, &global).await,
        Command::Namespace(args) => super::namespace::run(args.cmd, &global).await,
        Command::Version => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            Ok(EXIT_SUCCESS)
        }
    }
}

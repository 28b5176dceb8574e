use std::io;

use color_eyre::Result;
use tokio::io::BufReader;
use tracing::info;

use playground_realtime::adapters::TungsteniteConnector;
use playground_realtime::chat::PlaygroundChat;
use playground_realtime::cli::{parse_args, repl, CliCommand, USAGE, VERSION};
use playground_realtime::connection::ConnectionProvider;
use playground_realtime::startup::{init_logging, StartupConfig};

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let args = match parse_args(std::env::args())? {
        CliCommand::Version => {
            println!("playground {}", VERSION);
            return Ok(());
        }
        CliCommand::Help => {
            println!("{}", USAGE);
            return Ok(());
        }
        CliCommand::Run(args) => args,
    };

    let config = args.apply(StartupConfig::from_env()?)?;
    init_logging(config.verbose);

    let ws_config = config.ws_config();
    info!("Connecting to {}", ws_config.display_url());
    let mut provider = ConnectionProvider::new(TungsteniteConnector, ws_config);
    let manager = provider
        .on_session(config.session_token.as_deref())
        .await?;

    let chat = PlaygroundChat::new(&manager, config.endpoint_id.clone(), config.chat_config());
    match chat.endpoint_id() {
        Some(id) => println!("Chatting with endpoint {} (/help for commands)", id),
        None => println!("No endpoint selected; use /endpoint <id>"),
    }

    let stdin = BufReader::new(tokio::io::stdin());
    let mut stdout = io::stdout();
    tokio::select! {
        result = repl::run(&chat, stdin, &mut stdout) => result?,
        _ = tokio::signal::ctrl_c() => info!("Interrupted"),
    }

    drop(chat);
    provider.logout();
    Ok(())
}

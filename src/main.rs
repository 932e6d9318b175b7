use std::{
    io::{stdin, stdout, Write},
    path::PathBuf,
};

use anyhow::{bail, Context, Result};
use assistant_chat::{
    assistants::Tool, logging, session::FormattedMessage, util, AssistantSession, OpenAiClient,
    Settings,
};
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "assistant-chat", version, about = "Chat with an OpenAI assistant over your own documents")]
struct Cli {
    /// Environment file to load instead of `.env`
    #[arg(long, global = true)]
    env_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create the assistant and vector store (when not configured) and link them
    Setup {
        #[arg(long, default_value = "Document Assistant")]
        name: String,
        #[arg(
            long,
            default_value = "Answer questions using the uploaded documents. Say so when they do not cover the question."
        )]
        instructions: String,
        #[arg(long, default_value = "Documents")]
        vector_store_name: String,
    },
    /// Upload files into the vector store
    Upload {
        paths: Vec<PathBuf>,
        /// Upload every file directly inside this directory
        #[arg(long, conflicts_with = "paths")]
        dir: Option<PathBuf>,
    },
    /// Remove every recorded file from the vector store
    Clear,
    /// List the recorded files per vector store
    Files,
    /// Send one message and print the reply
    Ask {
        message: String,
        /// Instructions for this run, overriding the assistant's
        #[arg(long)]
        instructions: Option<String>,
    },
    /// Interactive conversation on the thread
    Chat {
        #[arg(long)]
        instructions: Option<String>,
    },
}

fn load_env(env_file: Option<&PathBuf>) -> Result<()> {
    match env_file {
        Some(path) => {
            dotenvy::from_path(path)
                .with_context(|| format!("failed to load {}", path.display()))?;
        }
        None => {
            dotenvy::dotenv().ok();
        }
    }
    Ok(())
}

fn print_reply(reply: &FormattedMessage) {
    println!("Assistant: {}", reply.text);
    for citation in &reply.citations {
        println!("  {citation}");
    }
}

async fn ask(session: &mut AssistantSession, message: &str, instructions: Option<&str>) -> Result<()> {
    session.create_thread().await?;
    session.add_message(message).await?;
    session.run_assistant(instructions).await?;
    let reply = session.wait_for_run_completion().await?;
    print_reply(&reply);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    load_env(cli.env_file.as_ref())?;

    let settings = Settings::from_env()?;
    logging::init(&settings.log_dir)?;

    let client = OpenAiClient::new(settings.credentials.clone())?;
    let mut session = AssistantSession::connect(client, &settings).await?;

    match cli.command {
        Command::Setup {
            name,
            instructions,
            vector_store_name,
        } => {
            let assistant_id = session
                .create_assistant(&name, &instructions, vec![Tool::file_search()])
                .await?
                .id
                .clone();
            let vector_store_id = session.create_vector_store(&vector_store_name).await?.to_string();
            session.attach_vector_store().await?;
            let thread_id = session.create_thread().await?.id.clone();

            println!("ASSISTANT_ID={assistant_id}");
            println!("VECTOR_STORE_ID={vector_store_id}");
            println!("THREAD_ID={thread_id}");
        }
        Command::Upload { paths, dir } => {
            let paths = match dir {
                Some(dir) => {
                    if !util::has_files(&dir)? {
                        bail!("{} contains no files", dir.display());
                    }
                    util::files_in(&dir)?
                }
                None => paths,
            };
            if paths.is_empty() {
                bail!("nothing to upload");
            }

            let records = session.upload_files_to_vector_store(&paths).await?;
            for record in records {
                println!("{} -> {}", record.file_path, record.file_id);
            }
        }
        Command::Clear => {
            if !session.vector_store_has_files().await? {
                println!("The vector store has no files.");
            }
            for path in session.clear_vector_store().await? {
                println!("Deleted {path}");
            }
        }
        Command::Files => {
            let metadata = session.metadata();
            if metadata.is_empty() {
                println!("No files recorded in {}", metadata.path().display());
            }
            for store_id in metadata.store_ids() {
                println!("{store_id}:");
                for record in metadata.records(store_id) {
                    println!("  {} ({})", record.file_path, record.file_id);
                }
            }
        }
        Command::Ask {
            message,
            instructions,
        } => ask(&mut session, &message, instructions.as_deref()).await?,
        Command::Chat { instructions } => loop {
            print!("User: ");
            stdout().flush()?;

            let mut line = String::new();
            if stdin().read_line(&mut line)? == 0 {
                break;
            }
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            if matches!(line, "exit" | "quit") {
                break;
            }

            if let Err(error) = ask(&mut session, line, instructions.as_deref()).await {
                eprintln!("error: {error:#}");
            }
        },
    }

    Ok(())
}

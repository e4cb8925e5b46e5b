use anyhow::Result;
use clap::Parser;
use datachat::llm::{OpenAiClient, DUMMY_API_KEY};
use datachat::render::render_result;
use datachat::{ChatConfig, ChatSession, ResolutionStrategy, Store, SynthesisMode};
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Parser)]
#[command(name = "datachat")]
#[command(about = "Natural language chatbot over a local SQLite database")]
struct Args {
    /// Question to answer; starts an interactive loop when omitted
    question: Option<String>,

    /// Path to the SQLite database file
    #[arg(short, long, default_value = "chatbot.db")]
    db: PathBuf,

    /// Intent resolution strategy
    #[arg(long, value_enum, default_value = "lexical")]
    strategy: ResolutionStrategy,

    /// SQL synthesis mode
    #[arg(long, value_enum, default_value = "template")]
    synthesis: SynthesisMode,

    /// Bind questions to this table instead of the first table
    #[arg(long)]
    table: Option<String>,

    /// Row limit for listing queries
    #[arg(long, default_value_t = 10)]
    limit: usize,

    /// OpenAI API key (or set OPENAI_API_KEY env var)
    #[arg(long)]
    api_key: Option<String>,

    /// Translate questions before resolution
    #[arg(long)]
    translate: bool,

    /// Create and seed the demo table when the database is empty
    #[arg(long)]
    seed: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt::init();

    let args = Args::parse();

    let store = Store::open(&args.db)?;
    if args.seed {
        seed_demo_data(&store)?;
    }

    let config = ChatConfig {
        strategy: args.strategy,
        synthesis: args.synthesis,
        table: args.table.clone(),
        list_limit: args.limit,
        ..ChatConfig::default()
    };

    let mut session = ChatSession::new(store, config);

    let needs_inference = args.strategy == ResolutionStrategy::Semantic
        || args.synthesis == SynthesisMode::Model
        || args.translate;
    if needs_inference {
        let api_key = args
            .api_key
            .or_else(|| std::env::var("OPENAI_API_KEY").ok())
            .unwrap_or_else(|| DUMMY_API_KEY.to_string());
        if api_key == DUMMY_API_KEY {
            info!("No API key configured, inference runs in offline mode");
        }
        let client = Arc::new(OpenAiClient::new(api_key));
        session = session.with_embedder(client.clone()).with_generator(client.clone());
        if args.translate {
            session = session.with_translator(client);
        }
    }

    match args.question {
        Some(question) => answer_one(&mut session, &question).await,
        None => interactive_loop(&mut session).await?,
    }

    Ok(())
}

async fn answer_one(session: &mut ChatSession, question: &str) {
    match session.ask(question).await {
        Ok(answer) => {
            println!("SQL: {}", answer.sql.sql);
            println!("{}", render_result(&answer.result));
        }
        Err(e) => eprintln!("Error: {}", e),
    }
}

/// One question per line; the session survives failed requests.
async fn interactive_loop(session: &mut ChatSession) -> Result<()> {
    println!("Ask questions about your data (empty line to quit).");
    let stdin = std::io::stdin();
    loop {
        print!("> ");
        std::io::stdout().flush()?;
        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let question = line.trim();
        if question.is_empty() {
            break;
        }
        answer_one(session, question).await;
    }
    Ok(())
}

/// Deployment-owned bootstrap for demos: the library core never
/// creates or seeds tables.
fn seed_demo_data(store: &Store) -> Result<()> {
    store.execute_batch(
        "CREATE TABLE IF NOT EXISTS empleados (
             id INTEGER PRIMARY KEY,
             nombre TEXT NOT NULL,
             puesto TEXT,
             salario REAL
         );
         INSERT INTO empleados (nombre, puesto, salario)
         SELECT 'Ana', 'Analista', 30000.0
         WHERE (SELECT COUNT(*) FROM empleados) = 0;
         INSERT INTO empleados (nombre, puesto, salario)
         SELECT 'Luis', 'Desarrollador', 45000.0
         WHERE (SELECT COUNT(*) FROM empleados) = 1;
         INSERT INTO empleados (nombre, puesto, salario)
         SELECT 'Marta', 'Gerente', 52000.0
         WHERE (SELECT COUNT(*) FROM empleados) = 2;",
    )?;
    info!("Demo table ready");
    Ok(())
}

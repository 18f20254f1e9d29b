//! pipes-demo - an in-memory "articles" host built on pipehandle
//!
//! Plays the part of a web framework: every request gets a context carrying
//! the JSON body and a response slot, and the handler produced by the
//! converter fills that slot.

use std::path::PathBuf;
use std::sync::Arc;
use std::thread;

use anyhow::{Context, Result, anyhow, bail};
use clap::{Parser, Subcommand};
use parking_lot::Mutex;
use pipehandle::handler::config::load_config;
use pipehandle::{Args, Converter, Flow, GenericHandler, Handler, HandlerConfig, PipeGroup, Seed, Step};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

#[derive(Parser)]
#[command(name = "pipes-demo")]
#[command(about = "Run the article pipeline against in-memory requests", long_about = None)]
struct Cli {
    /// Handler config file (JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create one article
    Create {
        /// Article title
        #[arg(long)]
        title: String,

        /// Article body
        #[arg(long)]
        body: String,
    },

    /// Create sample articles from concurrent requests
    Burst {
        /// Number of requests to send
        #[arg(short, long, default_value = "8")]
        count: usize,
    },
}

/// Response written by a step
#[derive(Debug, Clone)]
struct Response {
    status: u16,
    body: Value,
}

/// Per-request host context, passed to steps as argument 0
struct RequestContext {
    body: Value,
    response: Mutex<Option<Response>>,
}

impl RequestContext {
    fn new(body: Value) -> Self {
        Self {
            body,
            response: Mutex::new(None),
        }
    }

    fn json(&self, status: u16, body: Value) {
        *self.response.lock() = Some(Response { status, body });
    }

    fn take_response(&self) -> Option<Response> {
        self.response.lock().take()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ArticleRequest {
    title: String,
    body: String,
}

#[derive(Debug, Clone, Serialize)]
struct Article {
    id: usize,
    title: String,
    body: String,
}

#[derive(Default)]
struct ArticleStore {
    articles: Mutex<Vec<Article>>,
}

impl ArticleStore {
    fn insert(&self, request: &ArticleRequest) -> Article {
        let mut articles = self.articles.lock();
        let article = Article {
            id: articles.len() + 1,
            title: request.title.clone(),
            body: request.body.clone(),
        };
        articles.push(article.clone());
        article
    }

    fn all(&self) -> Vec<Article> {
        self.articles.lock().clone()
    }
}

/// Per-request instance
#[derive(Debug, Clone, Default)]
struct CreateArticle {
    request: ArticleRequest,
}

type HostHandler = Box<dyn Fn(Arc<RequestContext>) -> Result<()> + Send + Sync>;

fn host_converter() -> Converter<HostHandler> {
    Converter::new(|generic: GenericHandler| -> HostHandler {
        Box::new(move |ctx: Arc<RequestContext>| {
            let mut args = Args::new();
            args.push_shared(ctx);
            generic(args)
        })
    })
}

fn bind_request() -> Step<CreateArticle> {
    Step::named("bind-request", |action: &mut CreateArticle, args| {
        let ctx = args.require::<RequestContext>(0)?;
        action.request = serde_json::from_value(ctx.body.clone())
            .context("request body is not an article")?;
        Ok(Flow::Continue)
    })
}

fn validate_request() -> Step<CreateArticle> {
    Step::named("validate-request", |action: &mut CreateArticle, args| {
        let ctx = args.require::<RequestContext>(0)?;
        let mut errors = Vec::new();

        let title = &action.request.title;
        if !(3..=40).contains(&title.chars().count()) {
            errors.push("title: length must be between 3 and 40");
        }
        if !title.chars().all(|c| c.is_ascii_alphabetic()) {
            errors.push("title: letters only");
        }
        if !(10..=40).contains(&action.request.body.chars().count()) {
            errors.push("body: length must be between 10 and 40");
        }

        if errors.is_empty() {
            return Ok(Flow::Continue);
        }

        ctx.json(400, json!({ "errors": errors }));
        Ok(Flow::Stop)
    })
}

fn call_action(store: Arc<ArticleStore>) -> Step<CreateArticle> {
    Step::named("call-action", move |action: &mut CreateArticle, args| {
        let ctx = args.require::<RequestContext>(0)?;
        let article = store.insert(&action.request);
        ctx.json(200, serde_json::to_value(article)?);
        Ok(Flow::Stop)
    })
}

fn no_action() -> Step<CreateArticle> {
    Step::named("no-action", |_: &mut CreateArticle, _| {
        bail!("no action handled the request")
    })
}

fn article_pipes(store: Arc<ArticleStore>) -> PipeGroup<CreateArticle> {
    PipeGroup::new()
        .group(PipeGroup::new().step(bind_request()).step(validate_request()))
        .sequence(vec![call_action(store), no_action()])
}

fn send(handler: &HostHandler, body: Value) -> Result<Response> {
    let ctx = Arc::new(RequestContext::new(body));
    handler(ctx.clone())?;
    ctx.take_response()
        .context("pipeline finished without writing a response")
}

fn print_response(response: &Response) -> Result<()> {
    println!("{} {}", response.status, serde_json::to_string_pretty(&response.body)?);
    Ok(())
}

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => HandlerConfig {
            name: "create-article".to_string(),
            trace_steps: false,
        },
    };

    let store = Arc::new(ArticleStore::default());
    let handler = Handler::builder()
        .pipes(article_pipes(store.clone()))
        .seed(Seed::from_value(CreateArticle::default()))
        .converter(host_converter())
        .config(config)
        .build()?;
    let host = handler.produce();

    match cli.command {
        Commands::Create { title, body } => {
            let response = send(&host, json!({ "title": title, "body": body }))?;
            print_response(&response)?;
        }

        Commands::Burst { count } => {
            let responses = thread::scope(|scope| {
                let workers: Vec<_> = (0..count)
                    .map(|i| {
                        let host = &host;
                        scope.spawn(move || {
                            // Every third request fails validation.
                            let title = if i % 3 == 0 {
                                "No".to_string()
                            } else {
                                format!("Sample{}", "x".repeat(i % 5))
                            };
                            send(host, json!({ "title": title, "body": "generated body text" }))
                        })
                    })
                    .collect();

                workers
                    .into_iter()
                    .map(|worker| {
                        worker
                            .join()
                            .map_err(|_| anyhow!("request thread panicked"))
                            .and_then(|response| response)
                    })
                    .collect::<Result<Vec<_>>>()
            })?;

            let created = responses.iter().filter(|r| r.status == 200).count();
            println!("{} of {} requests created an article", created, count);
            println!("{}", serde_json::to_string_pretty(&store.all())?);
        }
    }

    Ok(())
}

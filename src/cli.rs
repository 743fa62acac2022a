use std::num::NonZeroUsize;
use std::time::Duration;

use clap::{ArgAction, Parser};

use crate::dispatch::DispatchOptions;
use crate::template::RequestTemplate;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about,
    long_about = None,
    after_help = "Example:\n  rustreq --url https://api.example.com/items --method POST --header \"Content-Type: application/json\" --body '{\"name\":\"new item\"}'\n\nConcurrency Example:\n  rustreq --url https://api.example.com/items --requests 100 --per-second 10"
)]
pub struct Args {
    /// The URL for the HTTP request
    #[arg(long, required = true)]
    pub url: String,

    /// The HTTP method to use (e.g., GET, POST, PUT, DELETE)
    #[arg(long, default_value = "GET")]
    pub method: String,

    /// The request body for POST, PUT, or PATCH requests
    #[arg(long, default_value = "")]
    pub body: String,

    /// The total number of requests to send
    #[arg(long, default_value_t = 1)]
    pub requests: u64,

    /// The maximum number of requests per second. 0 means no limit
    #[arg(long = "per-second", default_value_t = 0)]
    pub per_second: u32,

    /// A request header in 'Key: Value' format. Can be specified multiple times
    #[arg(long = "header", action = ArgAction::Append)]
    pub headers: Vec<String>,

    /// Timeout for each request in seconds. 0 means no timeout
    #[arg(long, default_value_t = 0)]
    pub timeout: u64,

    /// Maximum number of requests in flight at once. 0 means no limit
    #[arg(long = "max-in-flight", default_value_t = 0)]
    pub max_in_flight: usize,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

/// Everything a run needs, fixed at startup.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub template: RequestTemplate,
    pub requests: u64,
    pub per_second: u32,
    pub timeout: Option<Duration>,
    pub max_in_flight: Option<NonZeroUsize>,
}

impl RunConfig {
    pub fn is_single_shot(&self) -> bool {
        self.requests <= 1
    }

    pub fn dispatch_options(&self) -> DispatchOptions {
        DispatchOptions {
            total: self.requests,
            per_second: self.per_second,
            max_in_flight: self.max_in_flight,
        }
    }
}

impl From<Args> for RunConfig {
    fn from(args: Args) -> Self {
        let template = RequestTemplate::new(&args.method, &args.url, &args.body, args.headers);
        let timeout = (args.timeout > 0).then(|| Duration::from_secs(args.timeout));
        RunConfig {
            template,
            requests: args.requests,
            per_second: args.per_second,
            timeout,
            max_in_flight: NonZeroUsize::new(args.max_in_flight),
        }
    }
}

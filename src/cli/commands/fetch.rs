//! Fetch command - route one request through the cache

use crate::cli::args::FetchArgs;
use crate::config::Config;
use crate::error::{ShellCacheError, ShellCacheResult};
use crate::http::{Request, RequestMode};
use crate::router::{create_router, Lifecycle};
use console::style;
use std::io::{self, Write};
use tokio::fs;

/// Execute the fetch command
///
/// Status and strategy go to stderr so the body can be piped.
pub async fn execute(args: FetchArgs, config: &Config) -> ShellCacheResult<()> {
    let router = create_router(config)?;

    let mut request = Request::new(&args.method, &args.url);
    if args.navigate {
        request = request.with_mode(RequestMode::Navigate);
    }
    for (name, value) in args.headers {
        request = request.with_header(name, value);
    }

    let strategy = router.classify(&request);
    let response = router.on_intercept(&request).await?;
    router.flush().await;

    eprintln!(
        "{} {} {} [{}]",
        status_style(response.status),
        request.url,
        response.header("content-type").unwrap_or("-"),
        style(strategy).dim()
    );

    match args.output {
        Some(path) => {
            fs::write(&path, &response.body)
                .await
                .map_err(|e| ShellCacheError::io(format!("writing {}", path.display()), e))?;
        }
        None => {
            let mut stdout = io::stdout().lock();
            stdout
                .write_all(&response.body)
                .and_then(|_| stdout.flush())
                .map_err(|e| ShellCacheError::io("writing response body", e))?;
        }
    }

    Ok(())
}

fn status_style(status: u16) -> console::StyledObject<u16> {
    match status {
        200..=299 => style(status).green(),
        300..=399 => style(status).cyan(),
        _ => style(status).red(),
    }
}


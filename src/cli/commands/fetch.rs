//! Fetch command - answer one request through the controller

use crate::cli::args::FetchArgs;
use crate::cli::context::{fetcher, open_controller};
use crate::config::Config;
use crate::controller::FetchResponse;
use crate::error::{ShellcacheError, ShellcacheResult};
use crate::http::{Request, Response};
use console::style;
use std::io::{self, Write};
use tokio::fs;
use url::Url;

/// Execute the fetch command
pub async fn execute(args: FetchArgs, config: &Config) -> ShellcacheResult<()> {
    let controller = open_controller(config, &args.source).await?;

    let url = match Url::parse(&args.path) {
        Ok(url) => url,
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            controller.settings().scope_url().join(&args.path)?
        }
        Err(e) => return Err(e.into()),
    };
    let mut request = Request::get(url);
    if args.html {
        request = request.with_header("Accept", "text/html");
    }

    let (response, origin) = match controller.handle_fetch(&request).await? {
        FetchResponse::Respond(served) => {
            let origin = format!("{} ({})", served.source, served.strategy);
            (served.response, origin)
        }
        FetchResponse::Passthrough => {
            let network = fetcher(&args.source, config, controller.settings());
            (network.fetch(&request).await?, "passthrough".to_string())
        }
    };

    eprintln!(
        "{} {}",
        status_style(response.status),
        style(origin).dim()
    );

    if args.head {
        print_head(&response);
    } else if let Some(path) = args.output {
        fs::write(&path, &response.body)
            .await
            .map_err(|e| ShellcacheError::io(format!("writing {}", path.display()), e))?;
    } else {
        let mut stdout = io::stdout().lock();
        stdout
            .write_all(&response.body)
            .and_then(|_| stdout.flush())
            .map_err(|e| ShellcacheError::io("writing response body", e))?;
    }

    Ok(())
}

fn status_style(status: u16) -> console::StyledObject<u16> {
    match status {
        200..=299 => style(status).green(),
        300..=399 => style(status).yellow(),
        _ => style(status).red(),
    }
}

fn print_head(response: &Response) {
    println!("HTTP {} {}", response.status, response.kind);
    for (name, value) in response.headers.iter() {
        println!("{}: {}", name, value);
    }
}

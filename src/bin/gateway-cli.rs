use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use api_gateway::config::{load_or_default, GatewayConfig};
use api_gateway::routing::{router::parse_method, Router};

#[derive(Parser)]
#[command(name = "gateway-cli")]
#[command(about = "Offline tooling for the API gateway configuration", long_about = None)]
struct Cli {
    /// Configuration file; built-in defaults when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate the configuration and print the route table
    Check,
    /// Show which route, target and upstream path a request would get
    Route {
        /// HTTP method, e.g. GET
        method: String,
        /// Request path, e.g. /api/users/123
        path: String,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_or_default(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration invalid: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let router = match Router::from_config(&config.route_table()) {
        Ok(router) => router,
        Err(e) => {
            eprintln!("Route table invalid: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match cli.command {
        Commands::Check => {
            print_table(&config, &router);
            ExitCode::SUCCESS
        }
        Commands::Route { method, path } => {
            let Some(method) = parse_method(&method) else {
                eprintln!("Invalid method: {}", method);
                return ExitCode::FAILURE;
            };
            match router.route(&method, &path) {
                Ok(matched) => {
                    println!("route:  {}", matched.route);
                    println!("target: {}", matched.target);
                    println!("path:   {}", matched.path);
                    ExitCode::SUCCESS
                }
                Err(e) => {
                    println!("{}", e);
                    ExitCode::FAILURE
                }
            }
        }
    }
}

fn print_table(config: &GatewayConfig, router: &Router) {
    println!("Configuration OK");
    println!();
    println!("Routes (first match wins):");
    for (i, route) in router.routes().iter().enumerate() {
        let patterns: Vec<&str> = route.patterns().iter().map(|p| p.as_str()).collect();
        let methods = if route.methods().is_empty() {
            "*".to_string()
        } else {
            route.methods().iter().map(|m| m.as_str()).collect::<Vec<_>>().join(",")
        };
        println!(
            "  {}. {:<10} {:<8} {:<30} -> {}",
            i + 1,
            route.name(),
            methods,
            patterns.join(" "),
            route.target()
        );
        for rule in route.rewrites() {
            println!("       rewrite {} => {}", rule.pattern(), rule.replacement());
        }
    }

    println!();
    println!("Services:");
    for service in &config.services {
        println!(
            "  {:<16} {:?} [{}]",
            service.name,
            service.strategy,
            service.instances.join(", ")
        );
    }
}

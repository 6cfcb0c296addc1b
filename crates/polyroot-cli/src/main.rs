use futures::executor::block_on;
use polyroot_lang::{EngineConfig, LocalSolver, Session};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

fn main() {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("failed to set tracing subscriber: {e}");
        std::process::exit(1);
    }

    let args: Vec<String> = std::env::args().skip(1).collect();
    let expression = args.join(" ").trim().to_string();

    if expression.is_empty() {
        eprintln!("usage: polyroot <expression>");
        eprintln!("  e.g. polyroot \"x^2 - 3x + 2\"");
        eprintln!("  settings: POLYROOT_CONFIG='{{\"variable\": \"t\"}}'");
        std::process::exit(1);
    }

    let config = match std::env::var("POLYROOT_CONFIG") {
        Ok(json) => EngineConfig::from_json(&json).unwrap_or_else(|e| {
            eprintln!("error: {e}");
            std::process::exit(1);
        }),
        Err(_) => EngineConfig::default(),
    };

    let mut session = Session::new(config.clone());
    let polynomial = match polyroot_lang::parse_with_variable(&expression, &config.variable)
        .and_then(|expr| polyroot_lang::normalize_with_limit(&expr, config.max_degree))
    {
        Ok(p) => p,
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(1);
        }
    };
    println!("polynomial: {}", polynomial.render(&config.variable));

    let variable = config.variable.clone();
    let solver = LocalSolver::new(config);
    if let Err(e) = block_on(session.submit(&solver, &expression)) {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
    let view = session.view();
    match view.roots.as_deref() {
        _ if view.identically_zero => {
            println!("identically zero: every value of {variable} is a root")
        }
        Some([]) | None => println!("roots: none"),
        Some(roots) => println!("roots: {}", roots.join(", ")),
    }
    if let Some(factorization) = &view.factorization {
        println!("factorization: {factorization}");
    }
}

//! Report command implementation.

use crate::cli::ReportArgs;
use crate::config::{parse_domains, Config};
use crate::error::Result;
use crate::output::Formatter;
use quinta_domain::Domain;
use quinta_engine::{EngineConfig, ReportRunner, RunReport};
use quinta_sources::{LiveSource, MetricSource};

/// Execute the report command against the live sources.
pub async fn execute_report(args: ReportArgs, config: &Config, formatter: &Formatter) -> Result<()> {
    let domains = resolve_domains(&args, config)?;
    let engine = engine_config(&args, config);
    let source = LiveSource::new(config.live_source_config())?;

    let report = run_report(source, &domains, engine).await?;

    println!("{}", formatter.format_report(&report, args.rank)?);
    if let Some(failures) = formatter.failure_summary(&report) {
        eprintln!("{}", failures);
    }

    Ok(())
}

/// Run a report over `domains` with any metric source.
pub async fn run_report<S: MetricSource>(
    source: S,
    domains: &[Domain],
    engine: EngineConfig,
) -> Result<RunReport> {
    let runner = ReportRunner::new(source, engine);
    let report = runner.run(domains).await?;
    tracing::info!("Report finished.\n{}", report.summary.summary());
    Ok(report)
}

/// Domains from `--domain` flags, or the configured list if none were given.
pub fn resolve_domains(args: &ReportArgs, config: &Config) -> Result<Vec<Domain>> {
    if args.domains.is_empty() {
        config.domains()
    } else {
        parse_domains(&args.domains)
    }
}

/// Engine settings with command-line overrides applied.
pub fn engine_config(args: &ReportArgs, config: &Config) -> EngineConfig {
    let mut engine = config.engine_config();
    if args.fail_fast {
        engine.fail_fast = true;
    }
    if let Some(concurrency) = args.concurrency {
        engine.concurrency = concurrency;
    }
    engine
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CliError;
    use quinta_domain::SearchPerformance;
    use quinta_sources::{HostVisits, MockSite, MockSource};

    #[test]
    fn test_flags_override_config() {
        let config = Config::default();
        let args = ReportArgs {
            domains: vec!["example.com".into()],
            fail_fast: true,
            concurrency: Some(1),
            rank: false,
        };

        let domains = resolve_domains(&args, &config).unwrap();
        assert_eq!(domains.len(), 1);
        assert_eq!(domains[0].as_str(), "example.com");

        let engine = engine_config(&args, &config);
        assert!(engine.fail_fast);
        assert_eq!(engine.concurrency, 1);
    }

    #[test]
    fn test_configured_domains_by_default() {
        let config = Config::default();
        let domains = resolve_domains(&ReportArgs::default(), &config).unwrap();
        assert_eq!(domains.len(), config.domains.len());
        assert_eq!(engine_config(&ReportArgs::default(), &config), config.engine_config());
    }

    #[tokio::test]
    async fn test_run_report_with_mock_source() {
        let domain = Domain::parse("example.com").unwrap();
        let source = MockSource::new()
            .with_site(
                &domain,
                MockSite::default()
                    .words(500)
                    .search(SearchPerformance::new(10, 100, 3.0).unwrap()),
            )
            .with_property("properties/1", vec![HostVisits::new("example.com", 50)]);

        let report = run_report(source, &[domain], EngineConfig::default())
            .await
            .unwrap();
        assert_eq!(report.rows().next().unwrap().score, 50.25);
    }

    #[tokio::test]
    async fn test_run_report_propagates_abort() {
        let source = MockSource::new().with_failure("authenticate", None);
        let domain = Domain::parse("example.com").unwrap();

        let result = run_report(source, &[domain], EngineConfig::default()).await;
        assert!(matches!(result, Err(CliError::Engine(_))));
    }
}

use std::str::FromStr;
use std::time::Instant;

use anyhow::{anyhow, Result};
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use ffbb_api::{ClientConfig, FfbbApi, FfbbClient};
use ffbb_core::fields::{default_deep_limits, resolve, EntityKind, FieldPreset, FieldSet};
use ffbb_core::Wire;
use ffbb_schema::{Competition, Hit, Organisme, Poule};
use ffbb_search::{generate_queries, CategoryFilter, SearchIndex, SearchQuery, SearchResult};
use serde_json::Value;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "ffbbctl", version, about = "FFBB data platform client")]
struct Cli {
    /// Output format
    #[arg(short = 'o', long = "output", value_enum, global = true, default_value_t = Output::Human)]
    output: Output,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum Output { Human, Json }

#[derive(Subcommand, Debug)]
enum Commands {
    /// Search one or every index with a free-text term
    Search {
        term: String,
        /// Index uid or short name (repeatable), e.g. "organismes" or "ffbbserver_salles"
        #[arg(long = "index")]
        index: Vec<String>,
        /// Keep only matches/competitions of this category code, e.g. "U11M"
        #[arg(long = "category")]
        category: Option<String>,
        #[arg(long = "limit")]
        limit: Option<u32>,
    },
    /// Fetch one organisme by id
    Organisme {
        id: String,
        /// Preset (basic|default|detailed|engagements) or comma-separated field paths
        #[arg(long = "fields", default_value = "default")]
        fields: FieldSet,
    },
    /// Fetch one competition with its phases, pools and matches
    Competition {
        id: String,
        #[arg(long = "fields", default_value = "default")]
        fields: FieldSet,
    },
    /// Fetch one pool
    Poule {
        id: String,
        /// Standings only, without the match list
        #[arg(long = "ranking-only", action = ArgAction::SetTrue)]
        ranking_only: bool,
    },
    /// Fetch one match
    Rencontre {
        id: String,
        #[arg(long = "fields", default_value = "default")]
        fields: FieldSet,
    },
    /// List seasons
    Saisons {
        /// Only seasons flagged active
        #[arg(long = "current", action = ArgAction::SetTrue)]
        current: bool,
    },
    /// Matches currently followed live
    Lives,
    /// Print the field paths a preset resolves to (offline)
    Fields {
        /// organisme|competition|poule|saison|rencontre
        entity: EntityKind,
        #[arg(default_value = "default")]
        preset: FieldSet,
    },
}

fn init_tracing() {
    let env = std::env::var("FFBB_LOG").unwrap_or_else(|_| "warn".to_string());
    let filter = tracing_subscriber::EnvFilter::from_str(&env).unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(true).with_writer(std::io::stderr).init();
}

fn init_metrics() {
    if let Ok(addr) = std::env::var("FFBB_METRICS_ADDR") {
        if let Ok(sock) = addr.parse::<std::net::SocketAddr>() {
            let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
            match builder.with_http_listener(sock).install() {
                Ok(_) => tracing::info!(addr = %addr, "Prometheus metrics exporter listening"),
                Err(e) => tracing::warn!(error = %e, "failed to install metrics exporter"),
            }
        } else {
            tracing::warn!(addr = %addr, "invalid FFBB_METRICS_ADDR; expected host:port");
        }
    }
}

fn build_queries(term: &str, index: &[String], category: Option<&str>, limit: Option<u32>) -> Result<Vec<SearchQuery>> {
    let base = if index.is_empty() {
        generate_queries(Some(term))
    } else {
        index
            .iter()
            .map(|s| SearchIndex::parse(s).map(|i| SearchQuery::new(i).term(term)).ok_or_else(|| anyhow!("unknown index {s:?}")))
            .collect::<Result<Vec<_>>>()?
    };
    Ok(base
        .into_iter()
        .map(|q| {
            let q = match category { Some(c) => q.category(CategoryFilter::new(c)), None => q };
            match limit { Some(n) => q.limit(n), None => q }
        })
        .collect())
}

fn print_json(v: &Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(v)?);
    Ok(())
}

fn or_dash(s: Option<&str>) -> &str { s.unwrap_or("-") }

fn print_search(results: &[SearchResult]) {
    for r in results {
        let total = r.estimated_total_hits.unwrap_or(r.hits.len() as u64);
        println!("== {} ({} hits)", r.index_uid(), total);
        for h in &r.hits {
            let mut label = h.identifying_text().join(" • ");
            if let Hit::Rencontre(m) = h {
                if let Some(c) = m.competition_name() { label.push_str(&format!(" ({c})")); }
            }
            let cat = h.categorie().and_then(|c| c.code.as_deref()).unwrap_or("");
            println!("  {:<24} {:<6} {}", h.id(), cat, label);
        }
    }
}

fn print_organisme(o: &Organisme) {
    println!("{}", o.display_name());
    println!("  type:    {}", o.kind.map(|k| k.to_string()).unwrap_or_else(|| "-".into()));
    println!("  adresse: {}", or_dash(o.adresse.as_deref()));
    println!("  mail:    {}", or_dash(o.mail.as_deref()));
    if let Some(parent) = o.parent_id() { println!("  parent:  {parent}"); }
    for e in o.engagements() {
        println!("  engagement {} competition={}", or_dash(e.id.as_deref()), or_dash(e.competition_id()));
    }
}

fn print_poule(p: &Poule, indent: &str) {
    println!("{indent}poule {} {}", p.id, or_dash(p.nom.as_deref()));
    for c in p.classements() {
        println!(
            "{indent}  {:>3}. {:<32} {:>3} pts  {:+}",
            c.position.map(|v| v.to_string()).unwrap_or_else(|| "-".into()),
            or_dash(c.team_name()),
            c.points.unwrap_or(0),
            c.point_difference().unwrap_or(0)
        );
    }
    for m in p.rencontres() {
        let score = match (m.resultat_equipe1, m.resultat_equipe2) {
            (Some(a), Some(b)) => format!("{a} - {b}"),
            _ => "-".into(),
        };
        let when = m.date_rencontre.map(|d| d.to_string()).unwrap_or_default();
        println!("{indent}  {:<20} {:<48} {}", when, m.title(), score);
    }
}

fn print_competition(c: &Competition) {
    let cat = c.categorie.as_ref().and_then(|k| k.code.as_deref());
    println!("{} {} [{}]", c.id, or_dash(c.nom.as_deref()), or_dash(cat));
    for ph in c.phases() {
        println!("  phase {} {}", ph.id, or_dash(ph.nom.as_deref()));
        for p in ph.poules() {
            print_poule(p, "    ");
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    init_metrics();
    let cli = Cli::parse();

    if let Commands::Fields { entity, preset } = &cli.command {
        let paths = resolve(*entity, preset)?;
        match cli.output {
            Output::Human => {
                for p in &paths {
                    println!("{p}");
                }
                for d in default_deep_limits(*entity) {
                    println!("{}={}", d.query_key(), d.limit);
                }
            }
            Output::Json => print_json(&Value::from(paths))?,
        }
        return Ok(());
    }

    let started = Instant::now();
    let cfg = ClientConfig::from_env()?;
    let client = match FfbbClient::connect(cfg).await {
        Ok(c) => c,
        Err(e) => {
            error!(error = %e, "client setup failed");
            return Err(e.into());
        }
    };

    match cli.command {
        Commands::Search { term, index, category, limit } => {
            let queries = build_queries(&term, &index, category.as_deref(), limit)?;
            info!(term = %term, queries = queries.len(), "search invoked");
            let results = client.search(queries).await?;
            match cli.output {
                Output::Human => print_search(&results),
                Output::Json => print_json(&Value::from(results.iter().map(Wire::to_wire).collect::<Vec<_>>()))?,
            }
        }
        Commands::Organisme { id, fields } => match client.organisme(&id, &fields).await? {
            None => eprintln!("organisme {id} not found"),
            Some(o) => match cli.output {
                Output::Human => print_organisme(&o),
                Output::Json => print_json(&o.to_wire())?,
            },
        },
        Commands::Competition { id, fields } => match client.competition(&id, &fields).await? {
            None => eprintln!("competition {id} not found"),
            Some(c) => match cli.output {
                Output::Human => print_competition(&c),
                Output::Json => print_json(&c.to_wire())?,
            },
        },
        Commands::Poule { id, ranking_only } => {
            let fields = if ranking_only { FieldSet::Preset(FieldPreset::RankingOnly) } else { FieldSet::default() };
            match client.poule(&id, &fields).await? {
                None => eprintln!("poule {id} not found"),
                Some(p) => match cli.output {
                    Output::Human => print_poule(&p, ""),
                    Output::Json => print_json(&p.to_wire())?,
                },
            }
        }
        Commands::Rencontre { id, fields } => match client.rencontre(&id, &fields).await? {
            None => eprintln!("rencontre {id} not found"),
            Some(m) => match cli.output {
                Output::Human => {
                    println!("{} {}", m.id, m.title());
                    if let Some(d) = m.date_rencontre { println!("  date:   {d}"); }
                    if let Some(w) = m.winner() { println!("  winner: {w}"); }
                }
                Output::Json => print_json(&m.to_wire())?,
            },
        },
        Commands::Saisons { current } => {
            let saisons = client.saisons(current, &FieldSet::default()).await?;
            match cli.output {
                Output::Human => {
                    for s in &saisons {
                        println!("{:<10} {:<12} {}", s.id, s.label(), if s.is_current() { "active" } else { "" });
                    }
                }
                Output::Json => print_json(&Value::from(saisons.iter().map(Wire::to_wire).collect::<Vec<_>>()))?,
            }
        }
        Commands::Lives => {
            let lives = client.lives().await?;
            match cli.output {
                Output::Human => {
                    for l in &lives {
                        let status = l.status.map(|s| s.to_string()).unwrap_or_else(|| "-".into());
                        println!("{:<12} {:<48} {:>9} {}", l.match_id, l.title(), l.score_line(), status);
                    }
                }
                Output::Json => print_json(&Value::from(lives.iter().map(Wire::to_wire).collect::<Vec<_>>()))?,
            }
        }
        Commands::Fields { .. } => {}
    }
    info!(took_ms = %started.elapsed().as_millis(), "done");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn queries_default_to_every_index() {
        let qs = build_queries("Test", &[], Some("U11M"), Some(5)).unwrap();
        assert_eq!(qs.len(), SearchIndex::ALL.len());
        assert!(qs.iter().all(|q| q.limit == 5 && q.term.as_deref() == Some("Test")));
    }

    #[test]
    fn queries_accept_short_index_names() {
        let qs = build_queries("x", &["salles".into(), "ffbbserver_organismes".into()], None, None).unwrap();
        assert_eq!(qs[0].index, SearchIndex::Salles);
        assert_eq!(qs[1].index, SearchIndex::Organismes);
        assert!(build_queries("x", &["nope".into()], None, None).is_err());
    }

    #[test]
    fn cli_parses_field_sets() {
        let cli = Cli::try_parse_from(["ffbbctl", "-o", "json", "organisme", "9326", "--fields", "id,nom"]).unwrap();
        match cli.command {
            Commands::Organisme { id, fields } => {
                assert_eq!(id, "9326");
                assert_eq!(fields, FieldSet::Custom(vec!["id".into(), "nom".into()]));
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(cli.output, Output::Json);
    }
}

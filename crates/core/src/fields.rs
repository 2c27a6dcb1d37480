//! Field-selection presets for the REST backend.
//!
//! This module provides:
//! - Per-entity preset tables (basic / default / detailed, plus narrow projections)
//! - Validation of caller supplied paths
//! - `deep[...][_limit]` defaults for nested collections
//!
//! Paths are in wire dialect: they are sent verbatim as `fields[]` values.

use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Organisme,
    Competition,
    Poule,
    Saison,
    Rencontre,
}

impl EntityKind {
    pub const ALL: [EntityKind; 5] = [
        EntityKind::Organisme,
        EntityKind::Competition,
        EntityKind::Poule,
        EntityKind::Saison,
        EntityKind::Rencontre,
    ];

    /// REST collection name.
    pub fn collection(&self) -> &'static str {
        match self {
            EntityKind::Organisme => "ffbbserver_organismes",
            EntityKind::Competition => "ffbbserver_competitions",
            EntityKind::Poule => "ffbbserver_poules",
            EntityKind::Saison => "ffbbserver_saisons",
            EntityKind::Rencontre => "ffbbserver_rencontres",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EntityKind::Organisme => "organisme",
            EntityKind::Competition => "competition",
            EntityKind::Poule => "poule",
            EntityKind::Saison => "saison",
            EntityKind::Rencontre => "rencontre",
        };
        f.write_str(s)
    }
}

impl FromStr for EntityKind {
    type Err = FieldError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "organisme" | "organismes" => Ok(EntityKind::Organisme),
            "competition" | "competitions" => Ok(EntityKind::Competition),
            "poule" | "poules" => Ok(EntityKind::Poule),
            "saison" | "saisons" => Ok(EntityKind::Saison),
            "rencontre" | "rencontres" => Ok(EntityKind::Rencontre),
            other => Err(FieldError::UnknownEntity(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldPreset {
    Basic,
    Default,
    Detailed,
    /// Organisme without match data: identity plus team engagements.
    EngagementsOnly,
    /// Poule standings without the match list.
    RankingOnly,
}

impl fmt::Display for FieldPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FieldPreset::Basic => "basic",
            FieldPreset::Default => "default",
            FieldPreset::Detailed => "detailed",
            FieldPreset::EngagementsOnly => "engagements",
            FieldPreset::RankingOnly => "ranking",
        };
        f.write_str(s)
    }
}

/// What to ask the backend for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldSet {
    Preset(FieldPreset),
    Custom(Vec<String>),
}

impl Default for FieldSet {
    fn default() -> Self { FieldSet::Preset(FieldPreset::Default) }
}

impl FromStr for FieldSet {
    type Err = FieldError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let preset = match s.trim() {
            "basic" | "minimal" => Some(FieldPreset::Basic),
            "default" => Some(FieldPreset::Default),
            "detailed" => Some(FieldPreset::Detailed),
            "engagements" => Some(FieldPreset::EngagementsOnly),
            "ranking" => Some(FieldPreset::RankingOnly),
            _ => None,
        };
        if let Some(p) = preset { return Ok(FieldSet::Preset(p)); }
        let paths: Vec<String> = s.split(',').map(|p| p.trim().to_string()).filter(|p| !p.is_empty()).collect();
        if paths.is_empty() { return Err(FieldError::Empty); }
        Ok(FieldSet::Custom(paths))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FieldError {
    #[error("preset {preset} does not apply to {kind}")]
    NotApplicable { preset: FieldPreset, kind: EntityKind },
    #[error("invalid field path {0:?}")]
    InvalidPath(String),
    #[error("empty field selection")]
    Empty,
    #[error("unknown entity {0:?}")]
    UnknownEntity(String),
}

/// `deep[a][b][_limit]=N` for one nested collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeepLimit {
    pub path: &'static str,
    pub limit: u32,
}

impl DeepLimit {
    pub fn query_key(&self) -> String {
        let mut k = String::from("deep");
        for seg in self.path.split('.') {
            k.push('[');
            k.push_str(seg);
            k.push(']');
        }
        k.push_str("[_limit]");
        k
    }
}

// ---------------- Preset tables ----------------

const ORG_BASIC: &[&str] = &["id", "nom", "code", "type"];
const ORG_DEFAULT: &[&str] = &[
    "telephone",
    "adresse",
    "mail",
    "nomClubPro",
    "adresseClubPro",
    "urlSiteWeb",
    "offresPratiques",
    "commune.codePostal",
    "commune.libelle",
    "commune.departement.code",
    "cartographie.latitude",
    "cartographie.longitude",
    "logo.id",
    "organisme_id_pere.id",
    "organisme_id_pere.nom",
    "engagements.id",
    "engagements.idCompetition.id",
    "engagements.idCompetition.nom",
    "engagements.idCompetition.code",
    "engagements.idPoule.id",
    "competitions.id",
    "competitions.nom",
];
const ORG_DETAILED: &[&str] = &[
    "engagements.idCompetition.sexe",
    "engagements.idCompetition.categorie.code",
    "engagements.idCompetition.categorie.libelle",
    "competitions.code",
    "competitions.sexe",
    "membres.id",
    "membres.nom",
    "membres.prenom",
    "membres.fonction",
    "membres.mail",
    "salles.id",
    "salles.libelle",
    "salles.adresse",
    "salles.commune.libelle",
    "labellisation.id",
    "labellisation.libelle",
    "labellisation.debut",
    "labellisation.fin",
];
const ORG_ENGAGEMENTS: &[&str] = &[
    "engagements.id",
    "engagements.idCompetition.id",
    "engagements.idCompetition.nom",
    "engagements.idCompetition.code",
    "engagements.idCompetition.sexe",
    "engagements.idCompetition.categorie.code",
    "engagements.idPoule.id",
];

const COMP_BASIC: &[&str] = &["id", "nom", "code", "sexe"];
const COMP_DEFAULT: &[&str] = &[
    "saison",
    "typeCompetition",
    "liveStat",
    "categorie.code",
    "categorie.libelle",
    "organisateur.id",
    "organisateur.nom",
    "phases.id",
    "phases.nom",
    "phases.poules.id",
    "phases.poules.nom",
    "phases.poules.rencontres.id",
    "phases.poules.rencontres.numero",
    "phases.poules.rencontres.numeroJournee",
    "phases.poules.rencontres.date_rencontre",
    "phases.poules.rencontres.nomEquipe1",
    "phases.poules.rencontres.nomEquipe2",
    "phases.poules.rencontres.resultatEquipe1",
    "phases.poules.rencontres.resultatEquipe2",
    "phases.poules.rencontres.joue",
];
const COMP_DETAILED: &[&str] = &[
    "logo.id",
    "categorie.ordre",
    "phases.phase_code",
    "phases.poules.classements.organisme.id",
    "phases.poules.classements.organisme.nom",
    "phases.poules.classements.position",
    "phases.poules.classements.points",
    "phases.poules.rencontres.salle.id",
    "phases.poules.rencontres.salle.libelle",
    "phases.poules.rencontres.officiels.ordre",
    "phases.poules.rencontres.officiels.fonction",
    "phases.poules.rencontres.officiels.nom",
    "phases.poules.rencontres.officiels.prenom",
];

const POULE_BASIC: &[&str] = &["id", "nom"];
const POULE_RANKING: &[&str] = &[
    "classements.id",
    "classements.organisme.id",
    "classements.organisme.nom",
    "classements.position",
    "classements.points",
    "classements.matchJoues",
    "classements.gagnes",
    "classements.perdus",
    "classements.paniersMarques",
    "classements.paniersEncaisses",
    "classements.difference",
];
const POULE_MATCHES: &[&str] = &[
    "rencontres.id",
    "rencontres.numero",
    "rencontres.numeroJournee",
    "rencontres.date_rencontre",
    "rencontres.nomEquipe1",
    "rencontres.nomEquipe2",
    "rencontres.resultatEquipe1",
    "rencontres.resultatEquipe2",
    "rencontres.joue",
];
const POULE_DETAILED: &[&str] = &[
    "classements.nuls",
    "classements.quotient",
    "classements.nombreForfaits",
    "rencontres.salle.id",
    "rencontres.salle.libelle",
    "rencontres.officiels.ordre",
    "rencontres.officiels.fonction",
    "rencontres.officiels.nom",
    "rencontres.officiels.prenom",
];

const SAISON_BASIC: &[&str] = &["id", "code"];
const SAISON_DEFAULT: &[&str] = &["libelle", "actif", "debut", "fin"];

const RENC_BASIC: &[&str] = &["id", "numero", "date_rencontre"];
const RENC_DEFAULT: &[&str] = &[
    "numeroJournee",
    "nomEquipe1",
    "nomEquipe2",
    "resultatEquipe1",
    "resultatEquipe2",
    "joue",
    "idPoule",
    "salle.id",
    "salle.libelle",
];

/// Concatenate tables, dropping repeats while keeping first-seen order.
fn build(parts: &[&[&'static str]]) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for part in parts {
        for p in part.iter() {
            if !out.iter().any(|x| x == p) { out.push((*p).to_string()); }
        }
    }
    out
}

/// Smallest useful projection: identity, name and a couple of scalars.
pub fn basic_fields(kind: EntityKind) -> Vec<String> {
    match kind {
        EntityKind::Organisme => build(&[ORG_BASIC]),
        EntityKind::Competition => build(&[COMP_BASIC]),
        EntityKind::Poule => build(&[POULE_BASIC]),
        EntityKind::Saison => build(&[SAISON_BASIC]),
        EntityKind::Rencontre => build(&[RENC_BASIC]),
    }
}

/// Projection used when the caller does not pick one. Covers every field the
/// schema's derived accessors read.
pub fn default_fields(kind: EntityKind) -> Vec<String> {
    match kind {
        EntityKind::Organisme => build(&[ORG_BASIC, ORG_DEFAULT]),
        EntityKind::Competition => build(&[COMP_BASIC, COMP_DEFAULT]),
        EntityKind::Poule => build(&[POULE_BASIC, POULE_RANKING, POULE_MATCHES]),
        EntityKind::Saison => build(&[SAISON_BASIC, SAISON_DEFAULT]),
        EntityKind::Rencontre => build(&[RENC_BASIC, RENC_DEFAULT]),
    }
}

/// Deep traversal projection. Same as default for `Saison` and `Rencontre`.
pub fn detailed_fields(kind: EntityKind) -> Vec<String> {
    match kind {
        EntityKind::Organisme => build(&[ORG_BASIC, ORG_DEFAULT, ORG_DETAILED]),
        EntityKind::Competition => build(&[COMP_BASIC, COMP_DEFAULT, COMP_DETAILED]),
        EntityKind::Poule => build(&[POULE_BASIC, POULE_RANKING, POULE_MATCHES, POULE_DETAILED]),
        EntityKind::Saison | EntityKind::Rencontre => default_fields(kind),
    }
}

/// Organisme identity plus engagements; no member, venue or match data.
pub fn engagements_only_fields() -> Vec<String> { build(&[ORG_BASIC, ORG_ENGAGEMENTS]) }

/// Poule standings only; the match list is left out.
pub fn ranking_only_fields() -> Vec<String> { build(&[POULE_BASIC, POULE_RANKING]) }

pub fn preset_fields(kind: EntityKind, preset: FieldPreset) -> Result<Vec<String>, FieldError> {
    match (preset, kind) {
        (FieldPreset::Basic, k) => Ok(basic_fields(k)),
        (FieldPreset::Default, k) => Ok(default_fields(k)),
        (FieldPreset::Detailed, k) => Ok(detailed_fields(k)),
        (FieldPreset::EngagementsOnly, EntityKind::Organisme) => Ok(engagements_only_fields()),
        (FieldPreset::RankingOnly, EntityKind::Poule) => Ok(ranking_only_fields()),
        (preset, kind) => Err(FieldError::NotApplicable { preset, kind }),
    }
}

/// Resolve a field set to the concrete `fields[]` list for `kind`.
pub fn resolve(kind: EntityKind, set: &FieldSet) -> Result<Vec<String>, FieldError> {
    match set {
        FieldSet::Preset(p) => preset_fields(kind, *p),
        FieldSet::Custom(paths) => {
            if paths.is_empty() { return Err(FieldError::Empty); }
            let mut out: Vec<String> = Vec::with_capacity(paths.len());
            for p in paths {
                let norm = normalize_field_path(p).ok_or_else(|| FieldError::InvalidPath(p.clone()))?;
                if !out.contains(&norm) { out.push(norm); }
            }
            Ok(out)
        }
    }
}

/// Nested collections capped by default when fetching `kind`.
pub fn default_deep_limits(kind: EntityKind) -> Vec<DeepLimit> {
    match kind {
        EntityKind::Competition => vec![DeepLimit { path: "phases.poules.rencontres", limit: 1000 }],
        EntityKind::Poule => vec![DeepLimit { path: "rencontres", limit: 1000 }],
        EntityKind::Organisme => vec![DeepLimit { path: "engagements", limit: 200 }],
        EntityKind::Saison | EntityKind::Rencontre => Vec::new(),
    }
}

/// Accept dotted paths whose segments are `[A-Za-z0-9_-]+` or a lone `*`.
fn normalize_field_path(p: &str) -> Option<String> {
    let s = p.trim();
    let s = s.strip_prefix('.').unwrap_or(s);
    if s.is_empty() { return None; }
    for seg in s.split('.') {
        if seg.is_empty() { return None; }
        if seg == "*" { continue; }
        if !seg.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-') { return None; }
    }
    Some(s.to_string())
}

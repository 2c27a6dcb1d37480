//! FFBB record schema: REST entities, search-hit variants and their enums.
//!
//! Every record decodes through [`ffbb_core::RecordReader`], so the field
//! policy is uniform: unknown keys are ignored, absent and null fields are
//! `None`, malformed optional fields degrade to `None` with a warning, and only
//! primary identifiers are required. Encoding never writes a `null`.
//!
//! Derived accessors (`display_name`, `winner`, ...) are plain methods and are
//! never part of the wire form.

#![forbid(unsafe_code)]

#[macro_use]
mod macros;

pub mod common;
pub mod competition;
pub mod enums;
pub mod hits;
pub mod live;
pub mod organisme;
pub mod saison;

pub use common::{Cartographie, Categorie, Commune, Departement, Engagement, Labellisation, Logo, Membre, Officiel, Salle};
pub use competition::{Classement, Competition, Phase, Poule, Rencontre};
pub use enums::{CompetitionType, LiveStatus, OrganismeType, PratiqueType, Sexe, TournoiType};
pub use hits::{CompetitionHit, Hit, HitKind, OrganismeHit, PratiqueHit, RencontreHit, SalleHit, TerrainHit, TournoiHit};
pub use live::{Live, LiveScore};
pub use organisme::Organisme;
pub use saison::Saison;

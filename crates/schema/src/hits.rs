//! Search-engine hit shapes, one per index, and the closed [`Hit`] set.
//!
//! Hits are denormalised and sparser than the REST entities: everything but
//! `id` is optional.

use ffbb_core::{DateOrText, DecodeError, Ref, Wire};
use serde_json::Value;

use crate::common::{join_non_empty, Cartographie, Categorie, Commune, Logo, Salle};
use crate::competition::Competition;
use crate::enums::{CompetitionType, OrganismeType, PratiqueType, Sexe, TournoiType};
use crate::organisme::Organisme;

record! {
    pub struct OrganismeHit as "OrganismeHit" {
        id: String = "id" (id),
        nom: Option<String> = "nom" (opt),
        code: Option<String> = "code" (opt),
        kind: Option<OrganismeType> = "type" (opt),
        nom_club_pro: Option<String> = "nomClubPro" (opt),
        adresse: Option<String> = "adresse" (opt),
        telephone: Option<String> = "telephone" (opt),
        url_site_web: Option<String> = "urlSiteWeb" (opt),
        commune: Option<Commune> = "commune" (opt),
        cartographie: Option<Cartographie> = "cartographie" (opt),
        logo: Option<Logo> = "logo" (opt),
    }
}

record! {
    pub struct RencontreHit as "RencontreHit" {
        id: String = "id" (id),
        numero: Option<String> = "numero" (opt_id),
        numero_journee: Option<i64> = "numeroJournee" (opt),
        date_rencontre: Option<DateOrText> = "date_rencontre" (opt),
        nom_equipe1: Option<String> = "nomEquipe1" (opt),
        nom_equipe2: Option<String> = "nomEquipe2" (opt),
        resultat_equipe1: Option<i64> = "resultatEquipe1" (opt),
        resultat_equipe2: Option<i64> = "resultatEquipe2" (opt),
        competition: Option<Ref<Competition>> = "competitionId" (opt),
        id_poule: Option<String> = "idPoule" (opt_id),
        salle: Option<Salle> = "salle" (opt),
        niveau: Option<String> = "niveau" (opt),
    }
}

impl RencontreHit {
    pub fn title(&self) -> String {
        format!("{} vs {}", self.nom_equipe1.as_deref().unwrap_or("?"), self.nom_equipe2.as_deref().unwrap_or("?"))
    }

    pub fn categorie(&self) -> Option<&Categorie> { self.competition.as_ref()?.as_record()?.categorie.as_ref() }

    /// Category code of the embedded competition; `None` when only its id was sent.
    pub fn category_code(&self) -> Option<&str> { self.categorie()?.code.as_deref() }

    pub fn competition_name(&self) -> Option<&str> { self.competition.as_ref()?.as_record()?.nom.as_deref() }
}

record! {
    pub struct SalleHit as "SalleHit" {
        id: String = "id" (id),
        libelle: Option<String> = "libelle" (opt),
        adresse: Option<String> = "adresse" (opt),
        adresse_complement: Option<String> = "adresseComplement" (opt),
        commune: Option<Commune> = "commune" (opt),
        cartographie: Option<Cartographie> = "cartographie" (opt),
    }
}

impl SalleHit {
    /// `adresse, complement, code_postal ville` with missing parts skipped.
    pub fn full_address(&self) -> Option<String> {
        let locality = self.commune.as_ref().and_then(|c| {
            join_non_empty([c.code_postal.as_deref(), c.libelle.as_deref()], " ")
        });
        join_non_empty([self.adresse.as_deref(), self.adresse_complement.as_deref(), locality.as_deref()], ", ")
    }
}

record! {
    /// Outdoor court.
    pub struct TerrainHit as "TerrainHit" {
        id: String = "id" (id),
        nom: Option<String> = "nom" (opt),
        adresse: Option<String> = "adresse" (opt),
        commune: Option<Commune> = "commune" (opt),
        cartographie: Option<Cartographie> = "cartographie" (opt),
    }
}

record! {
    /// 3x3 tournament.
    pub struct TournoiHit as "TournoiHit" {
        id: String = "id" (id),
        nom: Option<String> = "nom" (opt),
        kind: Option<TournoiType> = "type" (opt),
        sexe: Option<Sexe> = "sexe" (opt),
        date_debut: Option<DateOrText> = "date_debut" (opt),
        date_fin: Option<DateOrText> = "date_fin" (opt),
        adresse: Option<String> = "adresse" (opt),
        commune: Option<Commune> = "commune" (opt),
        cartographie: Option<Cartographie> = "cartographie" (opt),
        organisateur: Option<Ref<Organisme>> = "organisateur" (opt),
    }
}

record! {
    pub struct CompetitionHit as "CompetitionHit" {
        id: String = "id" (id),
        nom: Option<String> = "nom" (opt),
        code: Option<String> = "code" (opt),
        sexe: Option<Sexe> = "sexe" (opt),
        saison: Option<String> = "saison" (opt_id),
        type_competition: Option<CompetitionType> = "typeCompetition" (opt),
        categorie: Option<Categorie> = "categorie" (opt),
        organisateur: Option<Ref<Organisme>> = "organisateur" (opt),
        niveau: Option<String> = "niveau" (opt),
    }
}

record! {
    /// Practice offer (5x5, 3x3, health basketball, ...).
    pub struct PratiqueHit as "PratiqueHit" {
        id: String = "id" (id),
        titre: Option<String> = "titre" (opt),
        kind: Option<PratiqueType> = "type" (opt),
        description: Option<String> = "description" (opt),
        adresse: Option<String> = "adresse" (opt),
        commune: Option<Commune> = "commune" (opt),
        cartographie: Option<Cartographie> = "cartographie" (opt),
        date_debut: Option<DateOrText> = "date_debut" (opt),
        date_fin: Option<DateOrText> = "date_fin" (opt),
        organisme: Option<Ref<Organisme>> = "organisme" (opt),
    }
}

fn town(commune: &Option<Commune>) -> Option<&str> { commune.as_ref()?.libelle.as_deref() }

/// Which hit shape an index produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HitKind {
    Organisme,
    Rencontre,
    Salle,
    Terrain,
    Tournoi,
    Competition,
    Pratique,
}

impl HitKind {
    pub fn decode(&self, value: &Value) -> Result<Hit, DecodeError> {
        Ok(match self {
            HitKind::Organisme => Hit::Organisme(OrganismeHit::from_wire(value)?),
            HitKind::Rencontre => Hit::Rencontre(RencontreHit::from_wire(value)?),
            HitKind::Salle => Hit::Salle(SalleHit::from_wire(value)?),
            HitKind::Terrain => Hit::Terrain(TerrainHit::from_wire(value)?),
            HitKind::Tournoi => Hit::Tournoi(TournoiHit::from_wire(value)?),
            HitKind::Competition => Hit::Competition(CompetitionHit::from_wire(value)?),
            HitKind::Pratique => Hit::Pratique(PratiqueHit::from_wire(value)?),
        })
    }
}

/// One decoded search row. The variant is fixed by the index that produced it.
#[derive(Debug, Clone, PartialEq)]
pub enum Hit {
    Organisme(OrganismeHit),
    Rencontre(RencontreHit),
    Salle(SalleHit),
    Terrain(TerrainHit),
    Tournoi(TournoiHit),
    Competition(CompetitionHit),
    Pratique(PratiqueHit),
}

impl Hit {
    pub fn kind(&self) -> HitKind {
        match self {
            Hit::Organisme(_) => HitKind::Organisme,
            Hit::Rencontre(_) => HitKind::Rencontre,
            Hit::Salle(_) => HitKind::Salle,
            Hit::Terrain(_) => HitKind::Terrain,
            Hit::Tournoi(_) => HitKind::Tournoi,
            Hit::Competition(_) => HitKind::Competition,
            Hit::Pratique(_) => HitKind::Pratique,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            Hit::Organisme(h) => &h.id,
            Hit::Rencontre(h) => &h.id,
            Hit::Salle(h) => &h.id,
            Hit::Terrain(h) => &h.id,
            Hit::Tournoi(h) => &h.id,
            Hit::Competition(h) => &h.id,
            Hit::Pratique(h) => &h.id,
        }
    }

    /// Competition category, for the hit kinds that carry one.
    pub fn categorie(&self) -> Option<&Categorie> {
        match self {
            Hit::Rencontre(h) => h.categorie(),
            Hit::Competition(h) => h.categorie.as_ref(),
            _ => None,
        }
    }

    /// Text that names the hit itself. Identifiers and nested records it only
    /// mentions (a match's competition) are not part of it.
    pub fn identifying_text(&self) -> Vec<&str> {
        let parts: Vec<Option<&str>> = match self {
            Hit::Organisme(h) => vec![h.nom.as_deref(), h.code.as_deref(), h.nom_club_pro.as_deref()],
            Hit::Rencontre(h) => vec![h.nom_equipe1.as_deref(), h.nom_equipe2.as_deref(), h.numero.as_deref()],
            Hit::Salle(h) => vec![h.libelle.as_deref(), town(&h.commune)],
            Hit::Terrain(h) => vec![h.nom.as_deref(), town(&h.commune)],
            Hit::Tournoi(h) => vec![h.nom.as_deref()],
            Hit::Competition(h) => vec![h.nom.as_deref(), h.code.as_deref()],
            Hit::Pratique(h) => vec![h.titre.as_deref()],
        };
        parts.into_iter().flatten().collect()
    }

    pub fn to_wire(&self) -> Value {
        match self {
            Hit::Organisme(h) => h.to_wire(),
            Hit::Rencontre(h) => h.to_wire(),
            Hit::Salle(h) => h.to_wire(),
            Hit::Terrain(h) => h.to_wire(),
            Hit::Tournoi(h) => h.to_wire(),
            Hit::Competition(h) => h.to_wire(),
            Hit::Pratique(h) => h.to_wire(),
        }
    }
}

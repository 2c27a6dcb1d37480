//! Small records shared by several entities.

use ffbb_core::{Ref, Timestamp};

use crate::competition::{Competition, Poule};

record! {
    pub struct Departement as "Departement" {
        code: Option<String> = "code" (opt),
        libelle: Option<String> = "libelle" (opt),
    }
}

record! {
    pub struct Commune as "Commune" {
        code_insee: Option<String> = "codeInsee" (opt),
        code_postal: Option<String> = "codePostal" (opt),
        libelle: Option<String> = "libelle" (opt),
        departement: Option<Departement> = "departement" (opt),
    }
}

record! {
    pub struct Cartographie as "Cartographie" {
        latitude: Option<f64> = "latitude" (opt),
        longitude: Option<f64> = "longitude" (opt),
        adresse: Option<String> = "adresse" (opt),
        code_postal: Option<String> = "codePostal" (opt),
        ville: Option<String> = "ville" (opt),
    }
}

impl Cartographie {
    pub fn coordinates(&self) -> Option<(f64, f64)> { Some((self.latitude?, self.longitude?)) }
}

record! {
    /// Asset reference; the image itself is served by the assets endpoint.
    pub struct Logo as "Logo" {
        id: Option<uuid::Uuid> = "id" (opt),
        gradient_color: Option<String> = "gradient_color" (opt),
    }
}

record! {
    /// Age/level category, e.g. code `U11M`.
    pub struct Categorie as "Categorie" {
        id: Option<String> = "id" (opt_id),
        code: Option<String> = "code" (opt),
        libelle: Option<String> = "libelle" (opt),
        ordre: Option<i64> = "ordre" (opt),
    }
}

impl Categorie {
    /// Case-insensitive match on code or label.
    pub fn matches(&self, needle: &str) -> bool {
        let eq = |s: &Option<String>| s.as_deref().map(|v| v.eq_ignore_ascii_case(needle)).unwrap_or(false);
        eq(&self.code) || eq(&self.libelle)
    }
}

record! {
    /// Venue (gymnasium).
    pub struct Salle as "Salle" {
        id: Option<String> = "id" (opt_id),
        libelle: Option<String> = "libelle" (opt),
        adresse: Option<String> = "adresse" (opt),
        adresse_complement: Option<String> = "adresseComplement" (opt),
        commune: Option<Commune> = "commune" (opt),
        cartographie: Option<Cartographie> = "cartographie" (opt),
    }
}

record! {
    /// Referee, scorer or table official attached to a match.
    pub struct Officiel as "Officiel" {
        ordre: Option<i64> = "ordre" (opt),
        fonction: Option<String> = "fonction" (opt),
        nom: Option<String> = "nom" (opt),
        prenom: Option<String> = "prenom" (opt),
    }
}

record! {
    /// A club team entered in a competition.
    pub struct Engagement as "Engagement" {
        id: Option<String> = "id" (opt_id),
        id_competition: Option<Ref<Competition>> = "idCompetition" (opt),
        id_poule: Option<Ref<Poule>> = "idPoule" (opt),
    }
}

impl Engagement {
    pub fn competition_id(&self) -> Option<&str> {
        match self.id_competition.as_ref()? {
            Ref::Record(c) => Some(&c.id),
            Ref::Id(id) => Some(id),
        }
    }
}

record! {
    pub struct Membre as "Membre" {
        id: Option<String> = "id" (opt_id),
        nom: Option<String> = "nom" (opt),
        prenom: Option<String> = "prenom" (opt),
        fonction: Option<String> = "fonction" (opt),
        mail: Option<String> = "mail" (opt),
        telephone: Option<String> = "telephone" (opt),
    }
}

record! {
    pub struct Labellisation as "Labellisation" {
        id: Option<String> = "id" (opt_id),
        libelle: Option<String> = "libelle" (opt),
        debut: Option<Timestamp> = "debut" (opt),
        fin: Option<Timestamp> = "fin" (opt),
    }
}

/// Join the non-empty parts with `sep`; `None` when nothing is left.
pub(crate) fn join_non_empty<'a>(parts: impl IntoIterator<Item = Option<&'a str>>, sep: &str) -> Option<String> {
    let parts: Vec<&str> = parts.into_iter().flatten().map(str::trim).filter(|s| !s.is_empty()).collect();
    if parts.is_empty() { None } else { Some(parts.join(sep)) }
}

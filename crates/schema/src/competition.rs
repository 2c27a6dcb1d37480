use ffbb_core::{Ref, Timestamp};

use crate::common::{Categorie, Logo, Officiel, Salle};
use crate::enums::{CompetitionType, Sexe};
use crate::organisme::Organisme;
use crate::saison::Saison;

record! {
    pub struct Competition as "Competition" {
        id: String = "id" (id),
        nom: Option<String> = "nom" (opt),
        code: Option<String> = "code" (opt),
        sexe: Option<Sexe> = "sexe" (opt),
        saison: Option<Ref<Saison>> = "saison" (opt),
        type_competition: Option<CompetitionType> = "typeCompetition" (opt),
        live_stat: Option<bool> = "liveStat" (opt),
        categorie: Option<Categorie> = "categorie" (opt),
        organisateur: Option<Ref<Organisme>> = "organisateur" (opt),
        logo: Option<Logo> = "logo" (opt),
        phases: Option<Vec<Phase>> = "phases" (opt),
    }
}

impl Competition {
    pub fn phases(&self) -> &[Phase] { self.phases.as_deref().unwrap_or(&[]) }

    pub fn poules(&self) -> impl Iterator<Item = &Poule> { self.phases().iter().flat_map(|p| p.poules()) }

    /// Every match of every pool of every phase, in wire order.
    pub fn all_rencontres(&self) -> impl Iterator<Item = &Rencontre> { self.poules().flat_map(|p| p.rencontres()) }
}

record! {
    pub struct Phase as "Phase" {
        id: String = "id" (id),
        nom: Option<String> = "nom" (opt),
        phase_code: Option<String> = "phase_code" (opt),
        poules: Option<Vec<Poule>> = "poules" (opt),
    }
}

impl Phase {
    pub fn poules(&self) -> &[Poule] { self.poules.as_deref().unwrap_or(&[]) }
}

record! {
    /// Pool: a group of teams with its standings and matches.
    pub struct Poule as "Poule" {
        id: String = "id" (id),
        nom: Option<String> = "nom" (opt),
        classements: Option<Vec<Classement>> = "classements" (opt),
        rencontres: Option<Vec<Rencontre>> = "rencontres" (opt),
    }
}

impl Poule {
    pub fn classements(&self) -> &[Classement] { self.classements.as_deref().unwrap_or(&[]) }

    pub fn rencontres(&self) -> &[Rencontre] { self.rencontres.as_deref().unwrap_or(&[]) }

    /// Best ranked standing row; rows without a position never lead.
    pub fn leader(&self) -> Option<&Classement> {
        self.classements().iter().filter(|c| c.position.is_some()).min_by_key(|c| c.position)
    }
}

record! {
    /// One standing row.
    pub struct Classement as "Classement" {
        id: Option<String> = "id" (opt_id),
        organisme: Option<Ref<Organisme>> = "organisme" (opt),
        position: Option<i64> = "position" (opt),
        points: Option<i64> = "points" (opt),
        match_joues: Option<i64> = "matchJoues" (opt),
        gagnes: Option<i64> = "gagnes" (opt),
        perdus: Option<i64> = "perdus" (opt),
        nuls: Option<i64> = "nuls" (opt),
        paniers_marques: Option<i64> = "paniersMarques" (opt),
        paniers_encaisses: Option<i64> = "paniersEncaisses" (opt),
        difference: Option<i64> = "difference" (opt),
        quotient: Option<f64> = "quotient" (opt),
        nombre_forfaits: Option<i64> = "nombreForfaits" (opt),
    }
}

impl Classement {
    /// Points scored minus conceded; the reported `difference` wins when present.
    pub fn point_difference(&self) -> Option<i64> {
        self.difference.or_else(|| Some(self.paniers_marques? - self.paniers_encaisses?))
    }

    pub fn team_name(&self) -> Option<&str> {
        match self.organisme.as_ref()? {
            Ref::Record(o) => o.nom.as_deref(),
            Ref::Id(_) => None,
        }
    }
}

record! {
    pub struct Rencontre as "Rencontre" {
        id: String = "id" (id),
        numero: Option<String> = "numero" (opt_id),
        numero_journee: Option<i64> = "numeroJournee" (opt),
        date_rencontre: Option<Timestamp> = "date_rencontre" (opt),
        nom_equipe1: Option<String> = "nomEquipe1" (opt),
        nom_equipe2: Option<String> = "nomEquipe2" (opt),
        resultat_equipe1: Option<i64> = "resultatEquipe1" (opt),
        resultat_equipe2: Option<i64> = "resultatEquipe2" (opt),
        joue: Option<bool> = "joue" (opt),
        id_engagement_equipe1: Option<String> = "idEngagementEquipe1" (opt_id),
        id_engagement_equipe2: Option<String> = "idEngagementEquipe2" (opt_id),
        id_poule: Option<String> = "idPoule" (opt_id),
        salle: Option<Salle> = "salle" (opt),
        officiels: Option<Vec<Officiel>> = "officiels" (opt),
    }
}

impl Rencontre {
    /// `home vs away`; unknown sides print as `?`.
    pub fn title(&self) -> String {
        format!("{} vs {}", self.nom_equipe1.as_deref().unwrap_or("?"), self.nom_equipe2.as_deref().unwrap_or("?"))
    }

    pub fn is_played(&self) -> bool {
        self.joue.unwrap_or(false) || (self.resultat_equipe1.is_some() && self.resultat_equipe2.is_some())
    }

    /// Name of the winning side. `None` for unplayed matches and draws.
    pub fn winner(&self) -> Option<&str> {
        if !self.is_played() { return None; }
        let (a, b) = (self.resultat_equipe1?, self.resultat_equipe2?);
        match a.cmp(&b) {
            std::cmp::Ordering::Greater => self.nom_equipe1.as_deref(),
            std::cmp::Ordering::Less => self.nom_equipe2.as_deref(),
            std::cmp::Ordering::Equal => None,
        }
    }
}

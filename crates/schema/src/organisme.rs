use ffbb_core::Ref;

use crate::common::{Cartographie, Commune, Engagement, Labellisation, Logo, Membre, Salle};
use crate::competition::Competition;
use crate::enums::OrganismeType;

record! {
    /// Club, committee, league or the federation itself.
    pub struct Organisme as "Organisme" {
        id: String = "id" (id),
        nom: Option<String> = "nom" (opt),
        code: Option<String> = "code" (opt),
        kind: Option<OrganismeType> = "type" (opt),
        telephone: Option<String> = "telephone" (opt),
        adresse: Option<String> = "adresse" (opt),
        mail: Option<String> = "mail" (opt),
        nom_club_pro: Option<String> = "nomClubPro" (opt),
        adresse_club_pro: Option<String> = "adresseClubPro" (opt),
        url_site_web: Option<String> = "urlSiteWeb" (opt),
        offres_pratiques: Option<Vec<String>> = "offresPratiques" (opt),
        commune: Option<Commune> = "commune" (opt),
        cartographie: Option<Cartographie> = "cartographie" (opt),
        logo: Option<Logo> = "logo" (opt),
        engagements: Option<Vec<Engagement>> = "engagements" (opt),
        membres: Option<Vec<Membre>> = "membres" (opt),
        competitions: Option<Vec<Competition>> = "competitions" (opt),
        salles: Option<Vec<Salle>> = "salles" (opt),
        labellisation: Option<Vec<Labellisation>> = "labellisation" (opt),
        /// Parent body (committee of a club, league of a committee).
        parent: Option<Box<Ref<Organisme>>> = "organisme_id_pere" (opt),
    }
}

impl Organisme {
    /// `nom (code)`, degrading to whichever part is known, then to the id.
    pub fn display_name(&self) -> String {
        match (self.nom.as_deref(), self.code.as_deref()) {
            (Some(nom), Some(code)) => format!("{nom} ({code})"),
            (Some(nom), None) => nom.to_string(),
            (None, Some(code)) => code.to_string(),
            (None, None) => self.id.clone(),
        }
    }

    pub fn is_club(&self) -> bool { matches!(self.kind, Some(OrganismeType::Club)) }

    pub fn parent_id(&self) -> Option<&str> {
        match self.parent.as_deref()? {
            Ref::Record(o) => Some(&o.id),
            Ref::Id(id) => Some(id),
        }
    }

    pub fn engagements(&self) -> &[Engagement] { self.engagements.as_deref().unwrap_or(&[]) }
}

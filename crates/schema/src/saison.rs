use ffbb_core::Timestamp;

record! {
    pub struct Saison as "Saison" {
        id: String = "id" (id),
        code: Option<String> = "code" (opt),
        libelle: Option<String> = "libelle" (opt),
        actif: Option<bool> = "actif" (opt),
        debut: Option<Timestamp> = "debut" (opt),
        fin: Option<Timestamp> = "fin" (opt),
    }
}

impl Saison {
    /// Label, else code, else id.
    pub fn label(&self) -> &str {
        self.libelle.as_deref().or(self.code.as_deref()).unwrap_or(self.id.as_str())
    }

    pub fn is_current(&self) -> bool { self.actif.unwrap_or(false) }

    /// Whether `at` falls within `[debut, fin]`. Unknown bounds are open.
    pub fn contains(&self, at: &Timestamp) -> bool {
        let after = self.debut.map(|d| d.naive() <= at.naive()).unwrap_or(true);
        let before = self.fin.map(|f| at.naive() <= f.naive()).unwrap_or(true);
        after && before
    }
}

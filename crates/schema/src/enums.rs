use ffbb_core::wire_enum;

wire_enum! {
    /// Kind of federation body. Labels are the ones the search facets report.
    pub enum OrganismeType {
        Club => "Club",
        Ctc => "Coopération Territoriale Club",
        Entente => "Entente",
        Comite => "Comité Départemental",
        Ligue => "Ligue Régionale",
        Federation => "Fédération",
    }
}

wire_enum! {
    pub enum Sexe {
        Masculin => "M",
        Feminin => "F",
        Mixte => "MF",
    }
}

wire_enum! {
    pub enum CompetitionType {
        Championnat => "CHAMP",
        Coupe => "COUPE",
        Plateau => "PLAT",
        Tournoi => "TOURNOI",
    }
}

wire_enum! {
    pub enum PratiqueType {
        CinqCinq => "5x5",
        TroisTrois => "3x3",
        MicroBasket => "Micro Basket",
        BasketTonik => "Basket Tonik",
        BasketSante => "Basket Santé",
        BasketInclusif => "Basket Inclusif",
        CentreGenerationBasket => "Centre Génération Basket",
    }
}

wire_enum! {
    /// Status reported by the live-scoring feed.
    pub enum LiveStatus {
        Scheduled => "SCHEDULED",
        InProgress => "IN_PROGRESS",
        HalfTime => "HALFTIME",
        Finished => "FINISHED",
        Cancelled => "CANCELLED",
    }
}

wire_enum! {
    pub enum TournoiType {
        OpenStart => "Open Start",
        OpenPlus => "Open Plus",
        OpenPlusAccess => "Open Plus Access",
        SuperOpen => "Super Open",
    }
}

use ffbb_core::Wire;
use ffbb_schema::*;
use serde_json::{json, Value};

/// encode(decode(v)) == encode(decode(encode(decode(v))))
fn assert_stable<T: Wire + std::fmt::Debug>(v: &Value) -> Value {
    let once = T::from_wire(v).unwrap_or_else(|e| panic!("decode {}: {e}", T::SHAPE)).to_wire();
    let twice = T::from_wire(&once).unwrap().to_wire();
    assert_eq!(once, twice, "{} is not round-trip stable", T::SHAPE);
    once
}

fn organisme_payload() -> Value {
    json!({
        "id": 200000002845137u64,
        "nom": "Basket Club Orléans",
        "code": "CVL0045001",
        "type": "Club",
        "telephone": "0238000000",
        "adresse": "1 rue du Stade",
        "mail": null,
        "nomClubPro": null,
        "urlSiteWeb": "https://example.org",
        "offresPratiques": ["5x5", "3x3"],
        "commune": {"codeInsee": "45234", "codePostal": "45000", "libelle": "Orléans",
                    "departement": {"code": "45", "libelle": "Loiret"}},
        "cartographie": {"latitude": 47.9, "longitude": 1.9, "ville": "Orléans"},
        "logo": {"id": "3fa85f64-5717-4562-b3fc-2c963f66afa6", "gradient_color": "#ff0000"},
        "engagements": [
            {"id": 11, "idCompetition": {"id": "c1", "nom": "U11 Masculins", "code": "U11M-D1",
                                          "categorie": {"code": "U11M", "libelle": "U11 Masculins"}},
             "idPoule": {"id": "p1"}},
            {"id": "12", "idCompetition": "c2", "idPoule": 99}
        ],
        "membres": [{"id": 1, "nom": "Martin", "prenom": "Anne", "fonction": "Présidente"}],
        "salles": [{"id": 5, "libelle": "Gymnase A", "commune": {"libelle": "Orléans"}}],
        "labellisation": [{"libelle": "Club formateur", "debut": "2023-09-01", "fin": "2026-08-31T00:00:00"}],
        "organisme_id_pere": {"id": "9", "nom": "Comité du Loiret", "type": "Comité Départemental"},
        "somethingNew": {"nested": true}
    })
}

fn competition_payload() -> Value {
    json!({
        "id": "c1",
        "nom": "U11 Masculins",
        "code": "U11M-D1",
        "sexe": "M",
        "saison": {"id": "s24", "code": "2024-2025", "actif": true},
        "typeCompetition": "CHAMP",
        "liveStat": false,
        "categorie": {"id": 3, "code": "U11M", "libelle": "U11 Masculins", "ordre": 4},
        "organisateur": 9,
        "phases": [{
            "id": "ph1",
            "nom": "Phase 1",
            "phase_code": "P1",
            "poules": [{
                "id": "p1",
                "nom": "Poule A",
                "classements": [
                    {"organisme": {"id": "o1", "nom": "A"}, "position": 1, "points": 10,
                     "matchJoues": 5, "gagnes": 5, "perdus": 0, "quotient": 1.25}
                ],
                "rencontres": [
                    {"id": 7, "numero": 12, "numeroJournee": 1, "date_rencontre": "2024-10-12T20:00:00+02:00",
                     "nomEquipe1": "A", "nomEquipe2": "B", "resultatEquipe1": 60, "resultatEquipe2": 50,
                     "joue": true, "idEngagementEquipe1": 11, "idPoule": "p1",
                     "salle": {"id": 5, "libelle": "Gymnase A"},
                     "officiels": [{"ordre": 1, "fonction": "Arbitre", "nom": "Durand"}]}
                ]
            }]
        }]
    })
}

#[test]
fn rest_entities_are_round_trip_stable() {
    assert_stable::<Organisme>(&organisme_payload());
    assert_stable::<Competition>(&competition_payload());
    assert_stable::<Saison>(&json!({"id": 24, "code": "2024-2025", "libelle": "2024/2025",
                                    "actif": true, "debut": "2024-07-01", "fin": "2025-06-30T23:59:59Z"}));
    assert_stable::<Live>(&json!({"matchId": "m1", "teamName_home": "A", "teamName_out": "B",
                                  "score_home": 10, "score_out": 8, "currentStatus": "IN_PROGRESS",
                                  "currentPeriod": 2, "clock": "04:12", "matchTime": "2024-10-12T20:00:00",
                                  "periods": [{"period": 1, "score_home": 10, "score_out": 8}]}));
}

#[test]
fn search_hits_are_round_trip_stable() {
    assert_stable::<OrganismeHit>(&json!({"id": 1, "nom": "BC", "type": "Coopération Territoriale Club",
                                          "commune": {"libelle": "Tours"}}));
    assert_stable::<RencontreHit>(&json!({"id": "match_Test_1", "date_rencontre": "2024-10-12 20:00:00",
                                          "competitionId": {"id": "c1", "categorie": {"code": "U11M"}}}));
    assert_stable::<SalleHit>(&json!({"id": "s", "libelle": "Gymnase", "cartographie": {"latitude": 48, "longitude": 2}}));
    assert_stable::<TerrainHit>(&json!({"id": "t", "nom": "Playground"}));
    assert_stable::<TournoiHit>(&json!({"id": "t", "type": "Super Open", "date_debut": "2025-05-01",
                                        "date_fin": "fin mai", "organisateur": "o1"}));
    assert_stable::<CompetitionHit>(&json!({"id": "c", "saison": 2024, "sexe": "F"}));
    assert_stable::<PratiqueHit>(&json!({"id": "p", "titre": "Basket Santé", "type": "Basket Santé"}));
}

#[test]
fn null_fields_are_omitted_on_encode() {
    let s = Saison::from_wire(&json!({"id": "p1", "libelle": null})).unwrap();
    assert_eq!(s.to_wire(), json!({"id": "p1"}));
    let o = Organisme::from_wire(&organisme_payload()).unwrap().to_wire();
    assert!(o.get("mail").is_none());
    assert!(o.get("nomClubPro").is_none());
}

#[test]
fn unknown_fields_are_tolerated_and_dropped() {
    let o = Organisme::from_wire(&organisme_payload()).unwrap();
    assert_eq!(o.nom.as_deref(), Some("Basket Club Orléans"));
    assert!(o.to_wire().get("somethingNew").is_none());
}

#[test]
fn numeric_and_string_identifiers_agree() {
    let a = Organisme::from_wire(&json!({"id": 200000002845137u64})).unwrap();
    let b = Organisme::from_wire(&json!({"id": "200000002845137"})).unwrap();
    assert_eq!(a.id, "200000002845137");
    assert_eq!(a, b);
    // Non-identifier fields are never coerced.
    let c = Organisme::from_wire(&json!({"id": 1, "nom": 42})).unwrap();
    assert_eq!(c.nom, None);
}

#[test]
fn identifier_coercion_reaches_nested_references() {
    let o = Organisme::from_wire(&organisme_payload()).unwrap();
    let ids: Vec<Option<&str>> = o.engagements().iter().map(|e| e.competition_id()).collect();
    assert_eq!(ids, vec![Some("c1"), Some("c2")]);
    assert_eq!(o.engagements()[1].id_poule.as_ref().and_then(|r| r.as_id()), Some("99"));
    assert_eq!(o.engagements()[0].id.as_deref(), Some("11"));
}

#[test]
fn timestamps_keep_their_flavour() {
    let c = Competition::from_wire(&competition_payload()).unwrap();
    let r = c.all_rencontres().next().unwrap();
    let ts = r.date_rencontre.unwrap();
    assert_eq!(ts.offset().map(|o| o.local_minus_utc()), Some(7200));
    assert_eq!(ts.date(), chrono::NaiveDate::from_ymd_opt(2024, 10, 12).unwrap());
    let wire = r.to_wire();
    assert_eq!(wire["date_rencontre"], json!("2024-10-12T20:00:00+02:00"));
    assert_eq!(wire["numero"], json!("12"));
}

#[test]
fn malformed_optional_date_degrades() {
    let s = Saison::from_wire(&json!({"id": "s", "debut": "bientôt", "fin": 3})).unwrap();
    assert_eq!(s.debut, None);
    assert_eq!(s.fin, None);
}

#[test]
fn non_object_records_are_rejected() {
    assert!(Organisme::from_wire(&json!([])).is_err());
    assert!(Competition::from_wire(&json!("c1")).is_err());
}

#[test]
fn non_finite_floats_are_omitted_on_encode() {
    let c = ffbb_schema::Classement { id: Some("1".into()), quotient: Some(f64::NAN), points: Some(10), ..Default::default() };
    assert_eq!(c.to_wire(), json!({"id": "1", "points": 10}));
}

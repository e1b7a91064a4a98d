//! String lookup for document labels.
//!
//! Templates use `{name}` placeholders. Unknown keys come back unchanged so a
//! missing translation shows up in the document instead of failing it.

use std::collections::HashMap;

pub trait Translate: Send + Sync {
    fn translate(&self, key: &str, params: &[(&str, String)]) -> String;
}

/// Any `t(key, params)` function can be used as a translator.
impl<F> Translate for F
where
    F: Fn(&str, &[(&str, String)]) -> String + Send + Sync,
{
    fn translate(&self, key: &str, params: &[(&str, String)]) -> String {
        self(key, params)
    }
}

const ENGLISH: &[(&str, &str)] = &[
    ("report.title", "REPORT CARD"),
    ("report.academic_year", "Academic year {year}"),
    ("report.page", "Page {page} of {total}"),
    ("period.sequence", "Sequence"),
    ("period.term", "Term"),
    ("period.year", "Annual"),
    ("section.student", "Student information"),
    ("section.summary", "Overall performance"),
    ("section.breakdown", "Results by subject"),
    ("section.remarks", "Remarks"),
    ("student.name", "Name"),
    ("student.matricule", "Registration no."),
    ("student.class", "Class"),
    ("student.date_of_birth", "Date of birth"),
    ("student.place_of_birth", "Place of birth"),
    ("student.gender", "Gender"),
    ("summary.average", "Average"),
    ("summary.rank", "Rank"),
    ("summary.total_points", "Total points"),
    ("summary.class_average", "Class average"),
    ("summary.total_coefficient", "Total coefficient"),
    ("summary.decision", "Decision"),
    ("summary.promotion_status", "Promotion status"),
    ("summary.promotion_remarks", "Promotion remarks"),
    ("decision.passed", "Passed"),
    ("decision.failed", "Failed"),
    ("promotion.status.promoted", "Promoted"),
    (
        "promotion.status.conditional_promotion",
        "Conditionally promoted",
    ),
    ("promotion.status.repeated", "Repeats the class"),
    (
        "promotion.remark.promoted",
        "Promoted to the next class with an average of {average}/20 and {passed} of {total} subjects passed.",
    ),
    (
        "promotion.remark.conditional_promotion",
        "Conditionally promoted with an average of {average}/20: {passed} of {total} subjects passed. Failed subjects must be made up.",
    ),
    (
        "promotion.remark.repeated",
        "Not promoted: average of {average}/20 with {passed} of {total} subjects passed. The student repeats the class.",
    ),
    ("table.subject", "Subject"),
    ("table.coefficient", "Coef."),
    ("table.score", "Score"),
    ("table.rank", "Rank"),
    ("table.class_average", "Class avg."),
    ("table.remarks", "Remarks"),
    ("table.teacher", "Teacher"),
    ("table.period_weight", "{name} (wt. {weight})"),
    ("table.subjects_passed", "{passed} of {total} subjects passed"),
    ("table.no_data", "No results recorded for this period."),
    ("cell.not_applicable", "N/A"),
    ("cell.absent", "Abs"),
    ("appreciation.excellent", "Excellent"),
    ("appreciation.very_good", "Very good"),
    ("appreciation.good", "Good"),
    ("appreciation.satisfactory", "Satisfactory"),
    ("appreciation.passing", "Passing"),
    ("appreciation.needs_improvement", "Needs improvement"),
    ("appreciation.weak", "Weak"),
    ("appreciation.very_weak", "Very weak"),
    ("remarks.none", "No remarks."),
    ("signature.dean", "Dean of Studies"),
    ("signature.principal", "Principal"),
];

const FRENCH: &[(&str, &str)] = &[
    ("report.title", "BULLETIN DE NOTES"),
    ("report.academic_year", "Année scolaire {year}"),
    ("report.page", "Page {page} sur {total}"),
    ("period.sequence", "Séquence"),
    ("period.term", "Trimestre"),
    ("period.year", "Annuel"),
    ("section.student", "Informations sur l'élève"),
    ("section.summary", "Résultats généraux"),
    ("section.breakdown", "Résultats par matière"),
    ("section.remarks", "Observations"),
    ("student.name", "Nom"),
    ("student.matricule", "Matricule"),
    ("student.class", "Classe"),
    ("student.date_of_birth", "Date de naissance"),
    ("student.place_of_birth", "Lieu de naissance"),
    ("student.gender", "Sexe"),
    ("summary.average", "Moyenne"),
    ("summary.rank", "Rang"),
    ("summary.total_points", "Total des points"),
    ("summary.class_average", "Moyenne de la classe"),
    ("summary.total_coefficient", "Total des coefficients"),
    ("summary.decision", "Décision"),
    ("summary.promotion_status", "Décision de passage"),
    ("summary.promotion_remarks", "Observations sur le passage"),
    ("decision.passed", "Admis"),
    ("decision.failed", "Non admis"),
    ("promotion.status.promoted", "Admis en classe supérieure"),
    (
        "promotion.status.conditional_promotion",
        "Admis sous conditions",
    ),
    ("promotion.status.repeated", "Redouble"),
    (
        "promotion.remark.promoted",
        "Admis en classe supérieure avec une moyenne de {average}/20 et {passed} matières validées sur {total}.",
    ),
    (
        "promotion.remark.conditional_promotion",
        "Admis sous conditions avec une moyenne de {average}/20 : {passed} matières validées sur {total}. Les matières non validées doivent être rattrapées.",
    ),
    (
        "promotion.remark.repeated",
        "Non admis : moyenne de {average}/20 avec {passed} matières validées sur {total}. L'élève redouble.",
    ),
    ("table.subject", "Matière"),
    ("table.coefficient", "Coef."),
    ("table.score", "Note"),
    ("table.rank", "Rang"),
    ("table.class_average", "Moy. classe"),
    ("table.remarks", "Appréciation"),
    ("table.teacher", "Enseignant"),
    ("table.period_weight", "{name} (poids {weight})"),
    ("table.subjects_passed", "{passed} matières validées sur {total}"),
    ("table.no_data", "Aucun résultat enregistré pour cette période."),
    ("cell.not_applicable", "N/A"),
    ("cell.absent", "Abs"),
    ("appreciation.excellent", "Excellent"),
    ("appreciation.very_good", "Très bien"),
    ("appreciation.good", "Bien"),
    ("appreciation.satisfactory", "Assez bien"),
    ("appreciation.passing", "Passable"),
    ("appreciation.needs_improvement", "Insuffisant"),
    ("appreciation.weak", "Faible"),
    ("appreciation.very_weak", "Très faible"),
    ("remarks.none", "Aucune observation."),
    ("signature.dean", "Le Préfet des études"),
    ("signature.principal", "Le Chef d'établissement"),
];

#[derive(Debug, Clone, Default)]
pub struct Catalog {
    locale: String,
    entries: HashMap<String, String>,
}

impl Catalog {
    pub fn english() -> Self {
        Self::from_entries("en", ENGLISH)
    }

    pub fn french() -> Self {
        Self::from_entries("fr", FRENCH)
    }

    /// `fr`, `fr-CM`, `fr_FR`… select French; anything else falls back to English.
    pub fn for_locale(locale: &str) -> Self {
        if locale.to_ascii_lowercase().starts_with("fr") {
            Self::french()
        } else {
            Self::english()
        }
    }

    pub fn with_overrides(mut self, overrides: HashMap<String, String>) -> Self {
        self.entries.extend(overrides);
        self
    }

    pub fn locale(&self) -> &str {
        &self.locale
    }

    fn from_entries(locale: &str, entries: &[(&str, &str)]) -> Self {
        Self {
            locale: locale.to_string(),
            entries: entries
                .iter()
                .map(|(key, value)| (key.to_string(), value.to_string()))
                .collect(),
        }
    }
}

impl Translate for Catalog {
    fn translate(&self, key: &str, params: &[(&str, String)]) -> String {
        match self.entries.get(key) {
            Some(template) => interpolate(template, params),
            None => key.to_string(),
        }
    }
}

fn interpolate(template: &str, params: &[(&str, String)]) -> String {
    params
        .iter()
        .fold(template.to_string(), |text, (name, value)| {
            text.replace(&format!("{{{name}}}"), value)
        })
}

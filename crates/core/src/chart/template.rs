//! Standard SYSCOHADA chart template.

use super::account::NewAccount;

/// (number, label, parent) rows of the standard chart, parents first.
const STANDARD_CHART: &[(&str, &str, Option<&str>)] = &[
    ("10", "Capital", None),
    ("101", "Capital social", Some("10")),
    ("11", "Réserves", None),
    ("111", "Réserve légale", Some("11")),
    ("12", "Report à nouveau", None),
    ("121", "Report à nouveau créditeur", Some("12")),
    ("129", "Report à nouveau débiteur", Some("12")),
    ("13", "Résultat net de l'exercice", None),
    ("131", "Résultat net : bénéfice", Some("13")),
    ("139", "Résultat net : perte", Some("13")),
    ("16", "Emprunts et dettes assimilées", None),
    ("162", "Emprunts et dettes auprès des établissements de crédit", Some("16")),
    ("21", "Immobilisations incorporelles", None),
    ("213", "Logiciels et sites internet", Some("21")),
    ("24", "Matériel, mobilier et actifs biologiques", None),
    ("244", "Matériel et mobilier", Some("24")),
    ("245", "Matériel de transport", Some("24")),
    ("28", "Amortissements", None),
    ("284", "Amortissements du matériel", Some("28")),
    ("31", "Marchandises", None),
    ("311", "Marchandises A", Some("31")),
    ("40", "Fournisseurs et comptes rattachés", None),
    ("401", "Fournisseurs, dettes en compte", Some("40")),
    ("41", "Clients et comptes rattachés", None),
    ("411", "Clients", Some("41")),
    ("42", "Personnel", None),
    ("422", "Personnel, rémunérations dues", Some("42")),
    ("43", "Organismes sociaux", None),
    ("431", "Sécurité sociale", Some("43")),
    ("44", "État et collectivités publiques", None),
    ("443", "État, TVA facturée", Some("44")),
    ("445", "État, TVA récupérable", Some("44")),
    ("52", "Banques", None),
    ("521", "Banques locales", Some("52")),
    ("57", "Caisse", None),
    ("571", "Caisse siège social", Some("57")),
    ("58", "Virements internes", None),
    ("585", "Virements de fonds", Some("58")),
    ("60", "Achats et variations de stocks", None),
    ("601", "Achats de marchandises", Some("60")),
    ("604", "Achats stockés de matières et fournitures consommables", Some("60")),
    ("61", "Transports", None),
    ("612", "Transports sur ventes", Some("61")),
    ("62", "Services extérieurs A", None),
    ("622", "Locations et charges locatives", Some("62")),
    ("63", "Services extérieurs B", None),
    ("631", "Frais bancaires", Some("63")),
    ("64", "Impôts et taxes", None),
    ("641", "Impôts et taxes directs", Some("64")),
    ("66", "Charges de personnel", None),
    ("661", "Rémunérations directes versées au personnel national", Some("66")),
    ("68", "Dotations aux amortissements", None),
    ("681", "Dotations aux amortissements d'exploitation", Some("68")),
    ("70", "Ventes", None),
    ("701", "Ventes de marchandises", Some("70")),
    ("706", "Services vendus", Some("70")),
    ("75", "Autres produits", None),
    ("758", "Produits divers", Some("75")),
    ("77", "Revenus financiers et produits assimilés", None),
    ("771", "Intérêts de prêts", Some("77")),
    ("81", "Valeurs comptables des cessions d'immobilisations", None),
    ("82", "Produits des cessions d'immobilisations", None),
];

/// Returns the compact SYSCOHADA chart, parents listed before children.
#[must_use]
pub fn standard_chart() -> Vec<NewAccount> {
    STANDARD_CHART
        .iter()
        .map(|(number, label, parent)| NewAccount {
            number: (*number).to_string(),
            label: (*label).to_string(),
            parent: parent.map(str::to_string),
        })
        .collect()
}

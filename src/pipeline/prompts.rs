//! Prompt construction for every pipeline step.
//!
//! The system prompts carry the legal-domain instructions; user prompts are
//! assembled from request data. All steps demand raw JSON output — fence
//! stripping in the step layer handles the models that ignore that.

use serde_json::{Map, Value};
use std::collections::BTreeMap;

use super::types::{ClientRecord, ContractBrief, FormSchema, ProfessionalRole};

/// Literal token marking data the contract still lacks. Completion must
/// leave it untouched wherever the party record has no matching field.
pub const PLACEHOLDER: &str = "[À COMPLÉTER]";

pub const CLARIFY_SYSTEM: &str = r#"Tu es un expert juridique spécialisé dans l'analyse de demandes de création de contrats.
Ton rôle est de transformer une demande en texte libre en un BRIEF STRUCTURÉ exploitable.

OBJECTIFS:
1. Identifier le type/variante exact du contrat
2. Identifier les parties et leurs rôles
3. Extraire le contexte et l'objectif
4. Repérer les points sensibles juridiques
5. Lister les annexes attendues
6. SURTOUT: Identifier les informations MANQUANTES critiques

RÈGLES STRICTES:
- NE JAMAIS INVENTER d'informations
- Si une info n'est pas fournie → la marquer comme MANQUANTE
- Priorités des infos manquantes:
  * "bloquant" = impossible de créer le contrat sans ça
  * "important" = qualité réduite sans ça
  * "optionnel" = améliore le contrat mais pas indispensable

- Points sensibles OBLIGATOIRES à vérifier selon type de contrat:
  * Dates et durées (début, fin, renouvellement)
  * Montants et modalités de paiement
  * Identité complète des parties
  * Clauses de résiliation
  * Juridiction compétente
  * Confidentialité / RGPD (si applicable)
  * Pénalités / dommages-intérêts
  * Propriété intellectuelle (si applicable)

FORMAT DE SORTIE: JSON strict
{
  "contractType": "Type exact du contrat",
  "variant": "Variante si applicable (ex: CDI, CDD)",
  "parties": [
    { "role": "Le vendeur", "description": "..." },
    { "role": "L'acquéreur", "description": "..." }
  ],
  "context": {
    "description": "Résumé du contexte",
    "objectif": "Objectif principal du contrat",
    "particularites": ["point 1", "point 2"]
  },
  "pointsSensibles": ["Clause de résiliation", "Modalités de paiement"],
  "annexesAttendues": ["Diagnostic technique", "Plan cadastral"],
  "missingInfo": [
    {
      "category": "Parties",
      "field": "identite_vendeur",
      "description": "Identité complète du vendeur (nom, prénom, adresse)",
      "priority": "bloquant"
    }
  ],
  "providedInfo": {
    "adresse_bien": "..."
  }
}

IMPORTANT: Retourne UNIQUEMENT le JSON, sans texte avant ou après."#;

pub fn clarify_user(
    contract_type: &str,
    role: ProfessionalRole,
    description: &str,
    existing_answers: Option<&Map<String, Value>>,
) -> String {
    let description = if description.is_empty() {
        "Contrat standard"
    } else {
        description
    };
    let mut prompt = format!(
        "Type de contrat: {contract_type}\nRôle du professionnel: {}\nDescription de la demande:\n{description}",
        role.display_name()
    );
    if let Some(answers) = existing_answers {
        let answers_json =
            serde_json::to_string_pretty(answers).unwrap_or_else(|_| "{}".to_string());
        prompt.push_str(&format!(
            "\n\nRéponses déjà fournies par le client:\n{answers_json}"
        ));
    }
    prompt.push_str("\n\nAnalyse cette demande et génère le brief structuré.");
    prompt
}

pub const SCHEMA_SYSTEM: &str = r#"Tu es un expert juridique spécialisé dans la génération de formulaires de contrats.
Ton rôle est de créer un schéma de formulaire JSON optimal pour un type de contrat donné.

RÈGLES CRITIQUES:
1. MINIMALISME : Ne demande QUE les informations ESSENTIELLES et LÉGALEMENT REQUISES
2. PAS DE SUPERFLU : Évite les champs optionnels ou "nice to have"
3. PERTINENCE : Adapte-toi à la description fournie par le professionnel
4. CLARTÉ : Champs avec labels clairs en français
5. VALIDATION : Marque les champs obligatoires

Structure du schéma JSON à retourner:
{
  "fields": [
    {
      "id": "unique_field_id",
      "label": "Libellé du champ",
      "type": "text|textarea|number|date|select|checkbox|file",
      "required": true,
      "placeholder": "Texte d'aide (optionnel)",
      "options": ["option1", "option2"]
    }
  ],
  "sections": [
    {
      "title": "Titre de la section",
      "fields": ["field_id_1", "field_id_2"]
    }
  ]
}

IMPORTANT:
- Si le contrat nécessite des pièces jointes (documents d'identité, diagnostics, etc.), ajoute des champs "file"
- Organise en sections logiques pour faciliter la saisie
- Maximum 15-20 champs pour éviter la surcharge
- Adapte-toi au contexte français et à la législation française"#;

pub fn schema_user(contract_type: &str, role: ProfessionalRole, description: &str) -> String {
    let description = if description.is_empty() {
        "Formulaire standard"
    } else {
        description
    };
    format!(
        "Type de contrat: {contract_type}\nRôle du professionnel: {}\nDescription/Besoin spécifique: {description}\n\nGénère le schéma JSON du formulaire optimal pour ce contrat.\nRetourne UNIQUEMENT le JSON, sans texte avant ou après.",
        role.display_name()
    )
}

/// Enriched description fed to the schema step: the original request plus
/// everything the clarification round already established.
pub fn enriched_description(original_request: &str, brief: &ContractBrief) -> String {
    let provided = serde_json::to_string_pretty(&brief.provided_info)
        .unwrap_or_else(|_| "{}".to_string());
    format!(
        "{original_request}\n\nContexte: {}\nObjectif: {}\nPoints sensibles: {}\n\nInformations fournies:\n{provided}",
        brief.context.description,
        brief.context.objectif,
        brief.points_sensibles.join(", ")
    )
}

pub const AUDIT_SYSTEM: &str = r#"Tu es un auditeur juridique expert qui vérifie la QUALITÉ et la COMPLÉTUDE des formulaires de contrats.
Ton rôle: analyser un schéma de formulaire et repérer TOUS les problèmes.

CRITÈRES D'AUDIT:

1. CHAMPS MANQUANTS
- Vérifier que TOUS les champs essentiels pour ce type de contrat sont présents
- Exemples par type de contrat:
  * Vente immobilière: adresse bien, prix, diagnostics, conditions suspensives
  * Contrat de travail: poste, rémunération, durée, lieu de travail, période d'essai
  * Bail: loyer, charges, durée, état des lieux, dépôt de garantie
  * Cession de droits: œuvre, droits cédés, territoire, durée, rémunération

2. INCOHÉRENCES
- Dates: date_fin doit être > date_debut, durée cohérente
- Montants: positifs, cohérents entre eux
- Dépendances logiques: si X alors Y doit exister
- Rôles des parties: cohérents avec le type de contrat

3. VALIDATIONS MANQUANTES
- Champs obligatoires bien marqués
- Validations de format (email, téléphone, SIRET, etc.)
- Validations de cohérence (comparaisons entre champs)
- Règles métier (ex: préavis minimum légal)

4. CLAUSES SENSIBLES NON COUVERTES (CRITIQUE)
Pour CHAQUE type de contrat, vérifier ces clauses:
- Résiliation / Rupture: conditions, préavis, indemnités
- Juridiction compétente et droit applicable
- Confidentialité (si applicable)
- RGPD / Protection des données (si données personnelles)
- Pénalités de retard / Dommages-intérêts
- Force majeure
- Propriété intellectuelle (si applicable)
- Non-concurrence / Non-sollicitation (si applicable)
- Assurances et responsabilités
- Garanties

SÉVÉRITÉ:
- "bloquant": Empêche la validité légale du contrat
- "important": Réduit fortement la qualité juridique
- "mineur": Amélioration possible

CORRECTIONS AUTOMATIQUES:
Pour chaque problème, propose une correction concrète:
- "add_field": Ajouter un champ manquant (fournis le schéma complet du champ)
- "modify_field": Modifier un champ existant (fournis les modifications)
- "add_validation": Ajouter une règle de validation (fournis la règle)
- "add_clause": Ajouter une clause au contrat (note pour la génération finale)

FORMAT DE SORTIE: JSON strict
{
  "issues": [
    {
      "id": "issue_1",
      "severity": "bloquant",
      "category": "champ_manquant",
      "title": "Titre court du problème",
      "description": "Description détaillée",
      "affectedFields": ["field1", "field2"],
      "suggestedFix": {
        "type": "add_field",
        "details": {}
      }
    }
  ],
  "hasCriticalIssues": false,
  "suggestions": ["Suggestion 1", "Suggestion 2"],
  "correctedSchema": {}
}

RÈGLES:
- Sois STRICT et EXHAUSTIF
- Privilégie la SÉCURITÉ JURIDIQUE
- Adapte-toi au droit français
- Si pas de problème → retourne issues: [] mais vérifie quand même tout
- Le schéma corrigé doit être COMPLET et DIRECTEMENT UTILISABLE

Retourne UNIQUEMENT le JSON, sans texte avant ou après."#;

pub fn audit_user(
    contract_type: &str,
    role: ProfessionalRole,
    brief: &ContractBrief,
    schema: &FormSchema,
) -> String {
    let brief_json = serde_json::to_string_pretty(brief).unwrap_or_else(|_| "{}".to_string());
    let schema_json = serde_json::to_string_pretty(schema).unwrap_or_else(|_| "{}".to_string());
    format!(
        "Type de contrat: {contract_type}\nRôle: {}\n\nBRIEF DU CONTRAT:\n{brief_json}\n\nSCHÉMA À AUDITER:\n{schema_json}\n\nEffectue un audit COMPLET et STRICT de ce schéma.\nRetourne le rapport d'audit au format JSON avec les corrections.",
        role.display_name()
    )
}

pub fn generate_system(contract_type: &str) -> String {
    format!(
        r#"Tu es un juriste rédacteur expert en droit français. Tu rédiges un contrat de type "{contract_type}" complet, structuré et directement utilisable.

RÈGLES STRICTES:
1. Utilise UNIQUEMENT les informations fournies dans les données du formulaire
2. Si un champ n'est pas fourni, écris "{PLACEHOLDER}" à sa place
3. N'invente JAMAIS de noms, dates, montants ou adresses
4. Structure le contrat en articles numérotés avec les clauses d'usage (objet, durée, obligations des parties, résiliation, juridiction compétente)
5. Adapte le vocabulaire et les clauses à la législation française en vigueur

Retourne UNIQUEMENT le texte du contrat, sans commentaire ni explication."#
    )
}

pub fn generate_user(
    contract_type: &str,
    form_data: &Map<String, Value>,
    client_info: Option<&Value>,
) -> String {
    let form_json = serde_json::to_string_pretty(form_data).unwrap_or_else(|_| "{}".to_string());
    let mut prompt = format!(
        "Type de contrat: {contract_type}\n\nDONNÉES DU FORMULAIRE:\n{form_json}"
    );
    if let Some(info) = client_info {
        let info_json = serde_json::to_string_pretty(info).unwrap_or_else(|_| "{}".to_string());
        prompt.push_str(&format!("\n\nINFORMATIONS CLIENT:\n{info_json}"));
    }
    prompt.push_str(&format!(
        "\n\nRédige le contrat complet. Pour chaque champ vide, manquant ou indéterminé: écris \"{PLACEHOLDER}\"."
    ));
    prompt
}

pub fn complete_system(parties_clients: &BTreeMap<String, ClientRecord>) -> String {
    let parties_info = parties_clients
        .iter()
        .map(|(party_name, client)| {
            format!("{party_name}:\n  - {}", client.summary_lines().join("\n  - "))
        })
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        r#"Tu es un assistant juridique expert. Ta mission est de compléter un contrat en remplaçant tous les "{PLACEHOLDER}" par les informations correctes des clients assignés à chaque partie.

RÈGLES STRICTES:
1. Analyse le contexte autour de chaque {PLACEHOLDER} pour comprendre quelle partie est concernée
2. Remplace uniquement par les informations disponibles de la partie concernée
3. Si une information n'existe pas pour un client, GARDE "{PLACEHOLDER}" (ne pas inventer)
4. Respecte exactement la mise en forme et la structure du contrat original
5. Ne modifie RIEN d'autre que les {PLACEHOLDER}
6. Sois cohérent: "né(e) le [DATE]", "de nationalité [NATIONALITE]", etc.

INFORMATIONS DES CLIENTS PAR PARTIE:
{parties_info}

Retourne UNIQUEMENT le contrat complété, sans commentaire ni explication."#
    )
}

pub fn complete_user(contract_content: &str) -> String {
    format!("Voici le contrat à compléter:\n\n{contract_content}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::types::BriefContext;

    fn sample_brief() -> ContractBrief {
        ContractBrief {
            contract_type: "Bail d'habitation".to_string(),
            variant: None,
            parties: vec![],
            context: BriefContext {
                description: "Location d'un studio meublé".to_string(),
                objectif: "Bail meublé d'un an".to_string(),
                particularites: vec![],
            },
            points_sensibles: vec!["Dépôt de garantie".to_string()],
            annexes_attendues: vec![],
            missing_info: vec![],
            provided_info: Map::new(),
        }
    }

    #[test]
    fn test_clarify_user_includes_answers() {
        let mut answers = Map::new();
        answers.insert("loyer_mensuel".to_string(), Value::from("850"));
        let prompt = clarify_user(
            "Bail d'habitation",
            ProfessionalRole::Notaire,
            "Studio à Lyon",
            Some(&answers),
        );
        assert!(prompt.contains("Rôle du professionnel: Notaire"));
        assert!(prompt.contains("Réponses déjà fournies par le client"));
        assert!(prompt.contains("loyer_mensuel"));
    }

    #[test]
    fn test_clarify_user_defaults_empty_description() {
        let prompt = clarify_user("NDA", ProfessionalRole::Avocat, "", None);
        assert!(prompt.contains("Contrat standard"));
        assert!(!prompt.contains("Réponses déjà fournies"));
    }

    #[test]
    fn test_enriched_description_carries_brief() {
        let description = enriched_description("Bail pour un studio", &sample_brief());
        assert!(description.contains("Bail pour un studio"));
        assert!(description.contains("Contexte: Location d'un studio meublé"));
        assert!(description.contains("Points sensibles: Dépôt de garantie"));
    }

    #[test]
    fn test_complete_system_lists_parties() {
        let mut parties = BTreeMap::new();
        parties.insert(
            "Le Bailleur".to_string(),
            ClientRecord {
                nom: Some("Durand".to_string()),
                prenom: Some("Claire".to_string()),
                ville: Some("Lyon".to_string()),
                ..Default::default()
            },
        );
        let system = complete_system(&parties);
        assert!(system.contains("Le Bailleur:"));
        assert!(system.contains("Nom complet: Claire Durand"));
        assert!(system.contains("Ville: Lyon"));
        assert!(system.contains(PLACEHOLDER));
    }
}

//! # Modelo de Lugar e Resolução de Identidade
//!
//! Um [`Place`] representa um ponto de interesse do distrito de Dobong (Seul).
//! Os registros vêm de fontes heterogêneas (listas JSON curadas, GeoJSON),
//! então o modelo mantém apenas os campos que o motor de pontuação entende
//! e preserva o restante intacto em `extra` para repassar ao cliente.
//!
//! ## Identidade
//!
//! Cada lugar precisa de um identificador estável para deduplicação entre as
//! duas listas de origem e para pertencimento às listas de "espaços escondidos".
//! A identidade é resolvida por prioridade fixa de campos:
//!
//! 1. `id`
//! 2. `placeId`
//! 3. `place_id`
//! 4. `name`
//!
//! O primeiro campo presente e não vazio vence. Um registro sem identidade
//! resolúvel não pode ser deduplicado nem pontuado e é descartado pelo motor.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Rótulo da categoria "느좋" (lugares calmos, de boa atmosfera).
pub const CATEGORY_NEUJOH: &str = "느좋";
/// Rótulo da categoria "핫플" (lugares populares, movimentados).
pub const CATEGORY_HOTPLE: &str = "핫플";

/// Faixa de visibilidade atribuída pelo motor de pontuação.
///
/// As três variantes são mutuamente exclusivas: um lugar pertence à faixa
/// dos 20% menos visíveis, à dos 50%, ou é "normal". A faixa dos 20% tem
/// precedência quando um id aparece em ambos os conjuntos.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BandLabel {
    /// Entre os 20% menos visíveis — o bônus mais forte.
    #[serde(rename = "숨은(20%)")]
    Hidden20,
    /// Entre os 50% menos visíveis — metade do bônus. Ponto de extensão:
    /// os dados atuais não populam esta faixa.
    #[serde(rename = "숨은(50%)")]
    Hidden50,
    /// Fora das listas de baixa visibilidade.
    #[serde(rename = "일반")]
    Normal,
}

impl BandLabel {
    /// Texto do rótulo como aparece na resposta JSON.
    pub fn label(&self) -> &'static str {
        match self {
            BandLabel::Hidden20 => "숨은(20%)",
            BandLabel::Hidden50 => "숨은(50%)",
            BandLabel::Normal => "일반",
        }
    }
}

/// Um ponto de interesse.
///
/// Os campos derivados `band_label` e `final_score` são escritos pelo motor
/// de pontuação a cada requisição, sempre em uma cópia do registro — o
/// snapshot carregado no início do processo nunca é mutado (ver
/// [`crate::scoring::score_places`]).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Place {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Id do serviço de mapas, grafia camelCase.
    #[serde(rename = "placeId", skip_serializing_if = "Option::is_none")]
    pub place_id: Option<String>,
    /// Id do serviço de mapas, grafia snake_case (fontes divergem).
    #[serde(rename = "place_id", skip_serializing_if = "Option::is_none")]
    pub place_id_alt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Conjunto de tags curtas de categoria (sem duplicatas, ordem livre).
    pub tags: Vec<String>,
    /// Categoria principal, gravada uma única vez na carga dos dados.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub main_category: Option<String>,
    /// Faixa de visibilidade — recomputada a cada requisição.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub band_label: Option<BandLabel>,
    /// Pontuação composta final — recomputada a cada requisição.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_score: Option<f64>,
    /// Atributos não reconhecidos (endereço, coordenadas, URLs de imagem e
    /// mapa...) repassados sem alteração.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Place {
    /// Constrói um [`Place`] a partir de um valor JSON arbitrário.
    ///
    /// A conversão é tolerante, nunca falha:
    /// - objeto: extrai os campos conhecidos, completa `name` a partir de
    ///   `title`/`place_name`/`id` quando ausente e guarda o resto em `extra`;
    /// - valor primitivo: sintetiza um registro usando o valor bruto como
    ///   identidade e nome, com tags vazias.
    pub fn from_value(value: Value) -> Place {
        let Value::Object(mut map) = value else {
            let s = scalar_to_string(&value).unwrap_or_default();
            return Place {
                id: Some(s.clone()),
                name: Some(s),
                ..Place::default()
            };
        };

        let id = take_string(&mut map, "id");
        let place_id = take_string(&mut map, "placeId");
        let place_id_alt = take_string(&mut map, "place_id");
        let mut name = take_string(&mut map, "name");
        let tags = take_tags(&mut map);
        let main_category = take_string(&mut map, "main_category");

        // Completa o nome para apresentação: title → place_name → id
        if name.as_deref().map_or(true, str::is_empty) {
            name = first_string(&map, &["title", "place_name"])
                .or_else(|| id.clone().filter(|s| !s.is_empty()));
        }

        Place {
            id,
            place_id,
            place_id_alt,
            name,
            tags,
            main_category,
            band_label: None,
            final_score: None,
            extra: map,
        }
    }
}

/// Resolve a identidade estável de um lugar.
///
/// Prioridade fixa: `id` → `placeId` → `place_id` → `name`; o primeiro
/// campo presente e não vazio vence. Função pura, usada tanto pelo
/// repositório (listas de baixa visibilidade) quanto pelo orquestrador
/// (mesclagem das duas categorias).
pub fn resolve_identity(place: &Place) -> Option<&str> {
    [
        place.id.as_deref(),
        place.place_id.as_deref(),
        place.place_id_alt.as_deref(),
        place.name.as_deref(),
    ]
    .into_iter()
    .flatten()
    .find(|s| !s.is_empty())
}

/// Converte um valor escalar em string (strings ficam sem aspas).
pub(crate) fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn take_string(map: &mut Map<String, Value>, key: &str) -> Option<String> {
    let value = map.remove(key)?;
    match scalar_to_string(&value) {
        Some(s) => Some(s),
        None => {
            // Não é escalar: devolve ao mapa para o repasse em `extra`
            map.insert(key.to_string(), value);
            None
        }
    }
}

fn first_string(map: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|k| map.get(*k).and_then(scalar_to_string))
        .find(|s| !s.is_empty())
}

/// `tags` pode vir como lista, como escalar solto ou faltar por completo.
fn take_tags(map: &mut Map<String, Value>) -> Vec<String> {
    let mut tags: Vec<String> = match map.remove("tags") {
        Some(Value::Array(items)) => items.iter().filter_map(scalar_to_string).collect(),
        Some(Value::Null) | None => vec![],
        Some(other) => scalar_to_string(&other).into_iter().collect(),
    };
    // Remove duplicatas preservando a primeira ocorrência
    let mut seen = std::collections::HashSet::new();
    tags.retain(|t| seen.insert(t.clone()));
    tags
}

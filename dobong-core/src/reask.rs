//! # Interpretação do Texto do Chat e Palavras-chave Alternativas
//!
//! O chatbot recebe texto livre ("조용한 정원 추천해줘"). Este módulo faz a
//! interpretação mínima por substring: deduz a categoria da conversa e a
//! primeira palavra-chave reconhecida. Quando uma busca rende poucos
//! resultados, [`suggest_alternatives`] propõe palavras-chave de fallback
//! para o usuário tentar de novo.

use serde::Serialize;

/// Resultado da interpretação do texto livre do usuário.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ParsedRequest {
    /// Categoria de conversa: "느좋" ou "숨은핫플" (rótulo de interface,
    /// distinto das duas categorias de dados).
    pub category: Option<String>,
    /// Primeira palavra-chave reconhecida no texto.
    pub keyword: Option<String>,
    /// Nunca deduzida do texto; reservado para clientes que enviem
    /// coordenadas.
    pub user_location: Option<(f64, f64)>,
}

/// Sugestão de palavras-chave alternativas para reformular a busca.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reask {
    pub message: String,
    pub alt_keywords: Vec<String>,
}

/// Palavras que indicam conversa sobre lugares calmos.
const CALM_HINTS: &[&str] = &["조용한", "둘레길", "공원", "자연", "느긋", "정원", "야경"];
/// Palavras que indicam conversa sobre lugares movimentados.
const HOT_HINTS: &[&str] = &["핫플", "카페", "맛집", "친구", "연인", "데이트"];
/// Palavras-chave reconhecidas, na ordem de prioridade de detecção.
const KNOWN_KEYWORDS: &[&str] = &[
    "친구", "연인", "데이트", "카페", "맛집", "가족", "조용한", "둘레길", "공원", "자연", "정원", "야경",
];

/// Palavras-chave base sugeridas quando a busca rende pouco.
const ALT_KEYWORDS: &[&str] = &["브런치 카페", "야경 좋은 곳", "조용한 정원", "둘레길"];

/// Interpreta o texto livre do usuário por correspondência de substring.
pub fn parse_user_text(user_text: &str) -> ParsedRequest {
    let text = user_text.to_lowercase();

    let category = if CALM_HINTS.iter().any(|hint| text.contains(hint)) {
        Some("느좋".to_string())
    } else if HOT_HINTS.iter().any(|hint| text.contains(hint)) {
        Some("숨은핫플".to_string())
    } else {
        None
    };

    let keyword = KNOWN_KEYWORDS
        .iter()
        .find(|kw| text.contains(*kw))
        .map(|kw| kw.to_string());

    ParsedRequest {
        category,
        keyword,
        user_location: None,
    }
}

/// Propõe até três palavras-chave alternativas, excluindo a atual.
pub fn suggest_alternatives(_category: Option<&str>, keyword: Option<&str>) -> Reask {
    let alt_keywords: Vec<String> = ALT_KEYWORDS
        .iter()
        .filter(|&&alt| keyword != Some(alt))
        .take(3)
        .map(|alt| alt.to_string())
        .collect();

    Reask {
        message: "대안 키워드를 제시합니다.".to_string(),
        alt_keywords,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_calm_hint_wins_category() {
        let parsed = parse_user_text("조용한 카페 알려줘");
        // A lista calma é verificada primeiro
        assert_eq!(parsed.category.as_deref(), Some("느좋"));
        assert_eq!(parsed.keyword.as_deref(), Some("카페"));
    }

    #[test]
    fn test_hot_hint_category() {
        let parsed = parse_user_text("친구랑 갈 맛집");
        assert_eq!(parsed.category.as_deref(), Some("숨은핫플"));
        // Primeira palavra-chave da lista de prioridade encontrada no texto
        assert_eq!(parsed.keyword.as_deref(), Some("친구"));
    }

    #[test]
    fn test_unrecognized_text() {
        let parsed = parse_user_text("도봉구 역사 알려줘");
        assert_eq!(parsed, ParsedRequest::default());
    }

    #[test]
    fn test_location_never_inferred() {
        let parsed = parse_user_text("공원 근처 37.66 127.04");
        assert_eq!(parsed.user_location, None);
    }

    #[test]
    fn test_alternatives_exclude_current_keyword() {
        let reask = suggest_alternatives(None, Some("둘레길"));
        assert_eq!(reask.alt_keywords, vec!["브런치 카페", "야경 좋은 곳", "조용한 정원"]);
    }

    #[test]
    fn test_alternatives_cap_at_three() {
        let reask = suggest_alternatives(Some("느좋"), None);
        assert_eq!(reask.alt_keywords.len(), 3);
    }
}

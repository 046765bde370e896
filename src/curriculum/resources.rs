use serde::Serialize;

/// External study resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resource {
    pub id: &'static str,
    pub category: &'static str,
    pub title: &'static str,
    pub url: &'static str,
    pub description: &'static str,
}

pub static RESOURCES: &[Resource] = &[
    Resource {
        id: "res_001",
        category: "Official & Simulation",
        title: "Le français des affaires - Official Samples",
        url: "https://www.lefrancaisdesaffaires.fr/en/candidate/test-evaluation-francais/tef-canada/preparation/",
        description: "Official CCI Paris sample papers for Reading, Listening, and Writing. The gold standard for exam format.",
    },
    Resource {
        id: "res_002",
        category: "Official & Simulation",
        title: "TV5Monde TEF Simulator",
        url: "https://apprendre.tv5monde.com/fr/tcf",
        description: "Real-condition 90-minute exam simulator. Best for testing endurance.",
    },
    Resource {
        id: "res_003",
        category: "Official & Simulation",
        title: "French Test Simulator",
        url: "https://frenchtestsimulator.com/",
        description: "Realistic online interface that mimics the official e-TEF software.",
    },
    Resource {
        id: "res_004",
        category: "Listening",
        title: "RFI Savoirs - Journal en français facile",
        url: "https://savoirs.rfi.fr/fr/apprendre-enseigner/langue-francaise/journal-en-francais-facile",
        description: "Daily 10-minute news with transcripts. Essential for Section C & D listening.",
    },
    Resource {
        id: "res_005",
        category: "Listening",
        title: "InnerFrench Podcast",
        url: "https://innerfrench.com/podcast/",
        description: "Intermediate listening (B1-B2) focusing on culture and society. Clear audio.",
    },
    Resource {
        id: "list_003",
        category: "Listening",
        title: "France Info - Direct Radio",
        url: "https://www.francetvinfo.fr/en-direct/radio.html",
        description: "Live French radio - authentic listening practice.",
    },
    Resource {
        id: "list_002",
        category: "Listening",
        title: "Podcast Français Facile",
        url: "https://www.podcastfrancaisfacile.com/",
        description: "Graded listening materials with transcripts from A1 to B2.",
    },
    Resource {
        id: "res_006",
        category: "Grammar",
        title: "Lawless French - Grammar by Level",
        url: "https://www.lawlessfrench.com/grammar/lessons-by-level/",
        description: "The primary grammar reference. CEFR-categorized lessons (A1-C1).",
    },
    Resource {
        id: "gram_002",
        category: "Grammar",
        title: "Le Point du FLE - Grammaire",
        url: "https://www.lepointdufle.net/p/grammaire.htm",
        description: "Extensive grammar resource directory with explanations and exercises.",
    },
    Resource {
        id: "gram_003",
        category: "Grammar",
        title: "Français Facile - Grammaire",
        url: "https://www.francaisfacile.com/index.php",
        description: "Thousands of free grammar exercises with instant feedback.",
    },
    Resource {
        id: "res_007",
        category: "Reading",
        title: "Le Monde",
        url: "https://www.lemonde.fr",
        description: "High-level authentic news for Section D reading practice.",
    },
    Resource {
        id: "res_008",
        category: "Vocabulary",
        title: "FrenchLearner Vocabulary Lists",
        url: "https://www.frenchlearner.com/vocabulary/environment/",
        description: "Thematic vocabulary lists (Environment, Health) crucial for Section B writing.",
    },
    Resource {
        id: "read_002",
        category: "Reading",
        title: "1jour1actu",
        url: "https://www.1jour1actu.com/",
        description: "News for young readers - accessible French at A2-B1 level.",
    },
    Resource {
        id: "read_003",
        category: "Reading",
        title: "Le Monde - Faits Divers",
        url: "https://www.lemonde.fr/police-justice/",
        description: "Real 'faits divers' articles - essential for TEF writing practice.",
    },
    Resource {
        id: "vocab_002",
        category: "Vocabulary",
        title: "WordReference French Dictionary",
        url: "https://www.wordreference.com/fr/",
        description: "Best online French-English dictionary with examples and forums.",
    },
    Resource {
        id: "vocab_003",
        category: "Vocabulary",
        title: "Larousse Dictionary",
        url: "https://www.larousse.fr/dictionnaires/francais",
        description: "Authoritative French monolingual dictionary.",
    },
    Resource {
        id: "vocab_001",
        category: "Vocabulary",
        title: "Quizlet - TEF Vocabulary Sets",
        url: "https://quizlet.com/subject/tef-canada/",
        description: "User-created TEF vocabulary flashcard sets.",
    },
    Resource {
        id: "writ_001",
        category: "Writing",
        title: "PrepMyFuture - TEF Writing Tips",
        url: "https://prepmyfuture.com/tef-canada-writing-tips/",
        description: "Free TEF writing strategies and task examples.",
    },
    Resource {
        id: "writ_002",
        category: "Writing",
        title: "BonPatron - Grammar Checker",
        url: "https://bonpatron.com/",
        description: "Free online grammar and spelling checker for French writing.",
    },
    Resource {
        id: "writ_003",
        category: "Writing",
        title: "Lingolia - French Writing Exercises",
        url: "https://francais.lingolia.com/en/writing",
        description: "Guided writing exercises and composition practice.",
    },
    Resource {
        id: "test_001",
        category: "Practice Tests",
        title: "PrepMyFuture - Free TEF Practice",
        url: "https://prepmyfuture.com/free-tef-canada-practice-tests/",
        description: "Free TEF practice tests and sample questions.",
    },
    Resource {
        id: "test_002",
        category: "Practice Tests",
        title: "RFI Savoirs - Test de niveau",
        url: "https://savoirs.rfi.fr/fr/testez-votre-niveau-de-francais",
        description: "Free level assessment test to track your progress.",
    },
    Resource {
        id: "cult_001",
        category: "Cultural Content",
        title: "Arte (Français)",
        url: "https://www.arte.tv/fr/",
        description: "French-German cultural TV channel with documentaries and films.",
    },
    Resource {
        id: "cult_002",
        category: "Cultural Content",
        title: "France 24 - L'info en continu",
        url: "https://www.france24.com/fr/",
        description: "24/7 French news channel with videos and articles.",
    },
    Resource {
        id: "cult_003",
        category: "Cultural Content",
        title: "Karambolage - Arte",
        url: "https://www.arte.tv/fr/videos/RC-014034/karambolage/",
        description: "Fun short videos comparing French and German cultures.",
    },
    Resource {
        id: "yt_001",
        category: "Cultural Content",
        title: "YouTube - Easy French",
        url: "https://www.youtube.com/@EasyFrench",
        description: "Street interviews in French with subtitles (great for listening).",
    },
    Resource {
        id: "pron_001",
        category: "Pronunciation",
        title: "Forvo - French Pronunciation",
        url: "https://forvo.com/languages/fr/",
        description: "Native speaker pronunciations for any French word.",
    },
    Resource {
        id: "pron_002",
        category: "Pronunciation",
        title: "YouTube - Français avec Pierre",
        url: "https://www.youtube.com/@francaisavecpierre",
        description: "Excellent pronunciation and speaking tutorials.",
    },
    Resource {
        id: "yt_002",
        category: "Pronunciation",
        title: "YouTube - Français Authentique",
        url: "https://www.youtube.com/@francaisauthentique",
        description: "Natural French learning through authentic content.",
    },
];

pub fn all_resources() -> &'static [Resource] {
    RESOURCES
}

pub fn resources_in_category(category: &str) -> Vec<&'static Resource> {
    let category = category.trim();
    RESOURCES
        .iter()
        .filter(|r| r.category.eq_ignore_ascii_case(category))
        .collect()
}

/// Case-insensitive match on title or description
pub fn search_resources(query: &str) -> Vec<&'static Resource> {
    let query = query.to_lowercase();
    RESOURCES
        .iter()
        .filter(|r| r.title.to_lowercase().contains(&query) || r.description.to_lowercase().contains(&query))
        .collect()
}

pub fn resource_by_id(id: &str) -> Option<&'static Resource> {
    RESOURCES.iter().find(|r| r.id == id)
}

/// Distinct categories in alphabetical order
pub fn categories() -> Vec<&'static str> {
    let mut categories: Vec<&'static str> = RESOURCES.iter().map(|r| r.category).collect();
    categories.sort_unstable();
    categories.dedup();
    categories
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_ids_are_unique() {
        let ids: HashSet<&str> = RESOURCES.iter().map(|r| r.id).collect();
        assert_eq!(ids.len(), RESOURCES.len());
    }

    #[test]
    fn test_categories_sorted() {
        let categories = categories();
        assert_eq!(categories.len(), 9);
        assert_eq!(categories.first(), Some(&"Cultural Content"));
        assert_eq!(categories.last(), Some(&"Writing"));
    }

    #[test]
    fn test_lookups() {
        assert_eq!(resource_by_id("res_002").map(|r| r.title), Some("TV5Monde TEF Simulator"));
        assert!(resource_by_id("missing").is_none());
        assert_eq!(resources_in_category("Official & Simulation").len(), 3);
        assert!(resources_in_category("Nonexistent").is_empty());
    }

    #[test]
    fn test_category_match_ignores_case() {
        let exact = resources_in_category("Writing");
        assert!(!exact.is_empty());
        assert_eq!(resources_in_category("writing").len(), exact.len());
        assert_eq!(resources_in_category(" WRITING ").len(), exact.len());
        assert_eq!(resources_in_category("official & simulation").len(), 3);
    }

    #[test]
    fn test_search_is_case_insensitive() {
        let hits = search_resources("SIMULATOR");
        assert!(hits.iter().any(|r| r.id == "res_002"));
        assert!(hits.iter().any(|r| r.id == "res_003"));
        assert!(search_resources("zzzz-no-match").is_empty());
    }
}

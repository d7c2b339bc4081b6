//! Russian function words
//!
//! Interjections, conjunctions, prepositions, particles and pronouns carry
//! no search value and are discarded before lemmas are counted. The list
//! holds lowercase surface forms with "ё" already folded to "е"; look-ups
//! must fold the candidate the same way.

const FUNCTION_WORDS: &[&str] = &[
    // prepositions
    "без", "безо", "благодаря", "в", "вдоль", "вместо", "вне", "внутри", "во", "возле", "вокруг",
    "для", "до", "за", "из", "изо", "к", "ко", "кроме", "между", "на", "над", "надо", "несмотря",
    "о", "об", "обо", "около", "от", "ото", "перед", "передо", "по", "под", "подо", "после", "при",
    "про", "против", "ради", "с", "сквозь", "со", "согласно", "среди", "у", "через",
    // conjunctions
    "а", "будто", "зато", "и", "ибо", "если", "или", "как", "когда", "либо", "ли", "но", "однако",
    "пока", "поскольку", "потому", "поэтому", "притом", "причем", "словно", "также", "тоже",
    "хотя", "что", "чтобы",
    // particles
    "б", "бы", "ведь", "вон", "вот", "даже", "давай", "давайте", "ж", "же", "именно", "лишь",
    "не", "неужели", "ни", "нибудь", "почти", "просто", "пускай", "пусть", "разве", "таки",
    "только", "уж", "уже",
    // pronouns (common inflected forms included)
    "вам", "вами", "вас", "ваш", "ваша", "ваше", "ваши", "весь", "все", "всего", "всей", "всем",
    "всеми", "всему", "всех", "вся", "вы", "его", "ее", "ей", "ему", "ею", "им", "ими", "их",
    "кем", "ком", "кому", "кого", "кто", "меня", "мне", "мной", "мною", "мое", "моего", "моей",
    "мои", "моих", "мой", "моя", "мы", "нам", "нами", "нас", "наш", "наша", "наше", "наши", "нее",
    "ней", "нем", "нему", "нею", "него", "ним", "ними", "них", "он", "она", "они", "оно", "сам",
    "сама", "сами", "само", "свое", "своего", "своей", "свои", "своих", "свой", "своя", "себе",
    "себя", "собой", "собою", "та", "те", "тебе", "тебя", "тем", "теми", "тех", "то", "тобой",
    "тобою", "того", "той", "том", "тому", "тот", "ты", "чего", "чем", "чему", "чей", "чье",
    "чьи", "чья", "эта", "эти", "этим", "этими", "этих", "это", "этого", "этой", "этом", "этому",
    "этот", "я",
    // interjections
    "ага", "ай", "алло", "ах", "ба", "ого", "ой", "ох", "тьфу", "увы", "угу", "ура", "фу", "эге",
    "эй", "эх", "ну",
];

/// Checks whether a lowercase, "ё"-folded token is a Russian function word
pub fn is_function_word(word: &str) -> bool {
    FUNCTION_WORDS.contains(&word)
}

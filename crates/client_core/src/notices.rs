//! User-facing, localized notifications for recoverable failures.

use shared::domain::UiLanguage;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NoticeKind {
    EmptyQuery,
    RecommendationFailed,
    QuestionsFailed,
    EligibilityFailed,
    DictationUnavailable,
    MicrophoneDenied,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub language: UiLanguage,
    pub message: &'static str,
}

impl Notice {
    pub fn localized(kind: NoticeKind, language: UiLanguage) -> Self {
        Self {
            kind,
            language,
            message: message_for(kind, language),
        }
    }
}

// Languages without a table fall back to English.
fn message_for(kind: NoticeKind, language: UiLanguage) -> &'static str {
    use NoticeKind::*;
    use UiLanguage::*;

    match (kind, language) {
        (EmptyQuery, Hindi) => "कृपया सबमिट करने से पहले अपनी ज़रूरतें बताएं।",
        (EmptyQuery, Marathi) => "कृपया सबमिट करण्यापूर्वी तुमच्या गरजा सांगा.",
        (EmptyQuery, Tamil) => "சமர்ப்பிக்கும் முன் உங்கள் தேவைகளை விவரிக்கவும்.",
        (EmptyQuery, Telugu) => "సమర్పించే ముందు మీ అవసరాలను వివరించండి.",
        (EmptyQuery, Punjabi) => "ਕਿਰਪਾ ਕਰਕੇ ਜਮ੍ਹਾਂ ਕਰਨ ਤੋਂ ਪਹਿਲਾਂ ਆਪਣੀਆਂ ਲੋੜਾਂ ਦੱਸੋ।",
        (EmptyQuery, _) => "Please describe your needs before submitting.",

        (RecommendationFailed, Hindi) => "योजनाएँ प्राप्त करने में त्रुटि। कृपया पुनः प्रयास करें।",
        (RecommendationFailed, Marathi) => "योजना मिळवताना त्रुटी आली. कृपया पुन्हा प्रयत्न करा.",
        (RecommendationFailed, Tamil) => "திட்டங்களைப் பெறுவதில் பிழை. மீண்டும் முயற்சிக்கவும்.",
        (RecommendationFailed, Telugu) => "పథకాలను పొందడంలో లోపం. దయచేసి మళ్లీ ప్రయత్నించండి.",
        (RecommendationFailed, Punjabi) => {
            "ਯੋਜਨਾਵਾਂ ਪ੍ਰਾਪਤ ਕਰਨ ਵਿੱਚ ਗਲਤੀ। ਕਿਰਪਾ ਕਰਕੇ ਦੁਬਾਰਾ ਕੋਸ਼ਿਸ਼ ਕਰੋ।"
        }
        (RecommendationFailed, _) => "Error fetching schemes. Please try again.",

        (QuestionsFailed, Hindi) => "पात्रता प्रश्न लोड नहीं हो सके। कृपया पुनः प्रयास करें।",
        (QuestionsFailed, Marathi) => "पात्रता प्रश्न लोड करता आले नाहीत. कृपया पुन्हा प्रयत्न करा.",
        (QuestionsFailed, Tamil) => "தகுதி கேள்விகளை ஏற்ற முடியவில்லை. மீண்டும் முயற்சிக்கவும்.",
        (QuestionsFailed, Telugu) => {
            "అర్హత ప్రశ్నలను లోడ్ చేయలేకపోయాము. దయచేసి మళ్లీ ప్రయత్నించండి."
        }
        (QuestionsFailed, Punjabi) => "ਯੋਗਤਾ ਸਵਾਲ ਲੋਡ ਨਹੀਂ ਹੋ ਸਕੇ। ਕਿਰਪਾ ਕਰਕੇ ਦੁਬਾਰਾ ਕੋਸ਼ਿਸ਼ ਕਰੋ।",
        (QuestionsFailed, _) => "Could not load eligibility questions. Please try again.",

        (EligibilityFailed, Hindi) => {
            "पात्रता की जाँच नहीं हो सकी। आपके उत्तर सुरक्षित हैं; कृपया पुनः प्रयास करें।"
        }
        (EligibilityFailed, Marathi) => {
            "पात्रता तपासता आली नाही. तुमची उत्तरे जतन आहेत; कृपया पुन्हा प्रयत्न करा."
        }
        (EligibilityFailed, Tamil) => {
            "தகுதியைச் சரிபார்க்க முடியவில்லை. உங்கள் பதில்கள் பாதுகாக்கப்பட்டுள்ளன; மீண்டும் முயற்சிக்கவும்."
        }
        (EligibilityFailed, Telugu) => {
            "అర్హతను తనిఖీ చేయలేకపోయాము. మీ సమాధానాలు భద్రంగా ఉన్నాయి; దయచేసి మళ్లీ ప్రయత్నించండి."
        }
        (EligibilityFailed, Punjabi) => {
            "ਯੋਗਤਾ ਦੀ ਜਾਂਚ ਨਹੀਂ ਹੋ ਸਕੀ। ਤੁਹਾਡੇ ਜਵਾਬ ਸੁਰੱਖਿਅਤ ਹਨ; ਕਿਰਪਾ ਕਰਕੇ ਦੁਬਾਰਾ ਕੋਸ਼ਿਸ਼ ਕਰੋ।"
        }
        (EligibilityFailed, _) => {
            "Could not check eligibility. Your answers are kept; please try again."
        }

        (DictationUnavailable, Hindi) => {
            "यहाँ आवाज़ इनपुट उपलब्ध नहीं है। कृपया अपना प्रश्न टाइप करें।"
        }
        (DictationUnavailable, Marathi) => "येथे आवाज इनपुट उपलब्ध नाही. कृपया तुमचा प्रश्न टाइप करा.",
        (DictationUnavailable, Tamil) => {
            "இங்கு குரல் உள்ளீடு ஆதரிக்கப்படவில்லை. உங்கள் கேள்வியைத் தட்டச்சு செய்யவும்."
        }
        (DictationUnavailable, Telugu) => {
            "ఇక్కడ వాయిస్ ఇన్‌పుట్ అందుబాటులో లేదు. దయచేసి మీ ప్రశ్నను టైప్ చేయండి."
        }
        (DictationUnavailable, Punjabi) => {
            "ਇੱਥੇ ਆਵਾਜ਼ ਇਨਪੁੱਟ ਉਪਲਬਧ ਨਹੀਂ ਹੈ। ਕਿਰਪਾ ਕਰਕੇ ਆਪਣਾ ਸਵਾਲ ਟਾਈਪ ਕਰੋ।"
        }
        (DictationUnavailable, _) => "Voice input is not supported here. Please type your query.",

        (MicrophoneDenied, Hindi) => {
            "माइक्रोफ़ोन की अनुमति नहीं मिली। आप अपना प्रश्न टाइप कर सकते हैं।"
        }
        (MicrophoneDenied, Marathi) => {
            "मायक्रोफोनची परवानगी नाकारली. तुम्ही तुमचा प्रश्न टाइप करू शकता."
        }
        (MicrophoneDenied, Tamil) => {
            "மைக்ரோஃபோன் அனுமதி மறுக்கப்பட்டது. உங்கள் கேள்வியைத் தட்டச்சு செய்யலாம்."
        }
        (MicrophoneDenied, Telugu) => {
            "మైక్రోఫోన్ అనుమతి నిరాకరించబడింది. మీరు మీ ప్రశ్నను టైప్ చేయవచ్చు."
        }
        (MicrophoneDenied, Punjabi) => {
            "ਮਾਈਕ੍ਰੋਫ਼ੋਨ ਦੀ ਇਜਾਜ਼ਤ ਨਹੀਂ ਮਿਲੀ। ਤੁਸੀਂ ਆਪਣਾ ਸਵਾਲ ਟਾਈਪ ਕਰ ਸਕਦੇ ਹੋ।"
        }
        (MicrophoneDenied, _) => "Microphone access denied. You can still type your query.",
    }
}

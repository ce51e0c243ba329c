//! Offline horoscope content.
//!
//! Used when the remote source fails or returns nothing: a fixed reading
//! per sign, and one generic reading for identifiers that name no sign.

use crate::model::horoscope::HoroscopeData;
use crate::model::zodiac::ZodiacSign;
use chrono::NaiveDate;

struct MockReading {
    description: &'static str,
    compatibility: &'static str,
    mood: &'static str,
    color: &'static str,
    lucky_number: &'static str,
    lucky_time: &'static str,
}

fn mock_reading(sign: ZodiacSign) -> MockReading {
    let (description, compatibility, mood, color, lucky_number, lucky_time) = match sign {
        ZodiacSign::Aries => (
            "Today brings new opportunities for growth and adventure. Trust your instincts and take bold steps forward.",
            "Leo", "Energetic", "Red", "7", "2pm to 3pm",
        ),
        ZodiacSign::Taurus => (
            "Stability and comfort are your focus today. Take time to appreciate the simple pleasures in life.",
            "Virgo", "Calm", "Green", "4", "10am to 11am",
        ),
        ZodiacSign::Gemini => (
            "Communication flows easily today. Connect with others and share your ideas freely.",
            "Aquarius", "Social", "Yellow", "3", "6pm to 7pm",
        ),
        ZodiacSign::Cancer => (
            "Emotions run deep today. Trust your intuition and nurture your relationships.",
            "Scorpio", "Nurturing", "Silver", "2", "7pm to 8pm",
        ),
        ZodiacSign::Leo => (
            "Your natural leadership shines bright today. Step into the spotlight with confidence.",
            "Aries", "Confident", "Gold", "8", "12pm to 1pm",
        ),
        ZodiacSign::Virgo => (
            "Attention to detail serves you well today. Focus on perfecting your craft.",
            "Taurus", "Analytical", "Navy Blue", "6", "9am to 10am",
        ),
        ZodiacSign::Libra => (
            "Balance and harmony guide your decisions today. Seek beauty in all things.",
            "Gemini", "Balanced", "Pink", "9", "4pm to 5pm",
        ),
        ZodiacSign::Scorpio => (
            "Intensity and passion fuel your actions today. Embrace transformation.",
            "Cancer", "Intense", "Deep Red", "5", "11pm to 12am",
        ),
        ZodiacSign::Sagittarius => (
            "Adventure calls to you today. Expand your horizons and seek new experiences.",
            "Aquarius", "Adventurous", "Purple", "3", "3pm to 4pm",
        ),
        ZodiacSign::Capricorn => (
            "Discipline and hard work pay off today. Stay focused on your long-term goals.",
            "Virgo", "Determined", "Brown", "10", "8am to 9am",
        ),
        ZodiacSign::Aquarius => (
            "Innovation and originality are your superpowers today. Think outside the box.",
            "Gemini", "Innovative", "Electric Blue", "11", "5pm to 6pm",
        ),
        ZodiacSign::Pisces => (
            "Dreams and intuition guide you today. Let your imagination flow freely.",
            "Cancer", "Dreamy", "Sea Green", "12", "8pm to 9pm",
        ),
    };
    MockReading {
        description,
        compatibility,
        mood,
        color,
        lucky_number,
        lucky_time,
    }
}

/// Fixed reading for a known sign, dated `today`.
pub fn mock_horoscope(sign: ZodiacSign, today: NaiveDate) -> HoroscopeData {
    let reading = mock_reading(sign);
    HoroscopeData {
        description: reading.description.to_string(),
        compatibility: reading.compatibility.to_string(),
        mood: reading.mood.to_string(),
        color: reading.color.to_string(),
        lucky_number: reading.lucky_number.to_string(),
        lucky_time: reading.lucky_time.to_string(),
        date_range: sign.date_range().to_string(),
        current_date: display_date(today),
    }
}

/// Reading used when the identifier matches no sign.
pub fn generic_horoscope(today: NaiveDate) -> HoroscopeData {
    HoroscopeData {
        description: "The stars are aligned in your favor today. Stay positive and embrace new opportunities.".to_string(),
        compatibility: "Unknown".to_string(),
        mood: "Optimistic".to_string(),
        color: "Blue".to_string(),
        lucky_number: "1".to_string(),
        lucky_time: "12pm to 1pm".to_string(),
        date_range: "Unknown".to_string(),
        current_date: display_date(today),
    }
}

/// Offline reading for a raw identifier: the sign's mock entry when it names
/// a sign (case-insensitive), otherwise the generic reading.
pub fn fallback_horoscope(sign: &str, today: NaiveDate) -> HoroscopeData {
    match sign.parse::<ZodiacSign>() {
        Ok(sign) => mock_horoscope(sign, today),
        Err(_) => generic_horoscope(today),
    }
}

/// Date formatted as `Mon Jan 15 2024`.
pub fn display_date(date: NaiveDate) -> String {
    date.format("%a %b %d %Y").to_string()
}

//! Local replies for messages that never reach the backend.
//!
//! Everything here is deterministic: greetings pick from a fixed list by
//! hashing the normalized message, and time replies read an injectable
//! [`Clock`].

use std::sync::Arc;

use chrono::{DateTime, Datelike, FixedOffset, Timelike};

use crate::classify::faq::CREATOR;
use crate::classify::{Category, Classification, Language};
use crate::clock::{Clock, SystemClock};
use crate::normalize::{normalize, string_hash};

const GREETINGS_ID: &[&str] = &[
    "Halo! Ada yang bisa saya bantu hari ini?",
    "Hai! Senang melihatmu. Ada pertanyaan apa?",
    "Halo! Saya Amelia AI, asisten virtualmu. Apa kabar?",
    "Hey! Siap membantu. Ada yang bisa kubantu?",
    "Selamat datang! Ada yang bisa saya bantu?",
];

const GREETINGS_EN: &[&str] = &[
    "Hi! How can I help you today?",
    "Hello! Great to see you. What brings you here?",
    "Hey there! I'm Amelia AI. What's on your mind?",
    "Hi there! Ready to help. What would you like to know?",
];

const DAYS_ID: [&str; 7] = ["Senin", "Selasa", "Rabu", "Kamis", "Jumat", "Sabtu", "Minggu"];

const MONTHS_ID: [&str; 12] = [
    "Januari",
    "Februari",
    "Maret",
    "April",
    "Mei",
    "Juni",
    "Juli",
    "Agustus",
    "September",
    "Oktober",
    "November",
    "Desember",
];

/// Reply used when the backend failed and no FAQ answer applies.
pub const APOLOGY: &str = "Maaf, saya sedang mengalami gangguan. Silakan coba lagi nanti.";

/// Reply for empty input.
pub const EMPTY_PROMPT: &str = "Silakan ketik pesan terlebih dahulu.";

const HELP: &str = "Halo! Saya Amelia AI. Saya bisa membantu Anda dengan:

📝 **Menjawab Pertanyaan**
- Informasi umum dan pengetahuan
- Penjelasan konsep dan definisi

💻 **Programming & Coding**
- Menulis dan menjelaskan kode
- Debugging dan optimisasi

🎨 **Konten Kreatif**
- Menulis cerita, puisi
- Ide dan brainstorming

📊 **Analisis & Research**
- Membandingkan topik
- Merangkum informasi

Apa yang ingin Anda tanyakan hari ini?";

/// Which canned ownership answer a message asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OwnershipTopic {
    Creator,
    Developer,
    Owner,
    Team,
    About,
}

impl OwnershipTopic {
    /// Pick the topic from sub-keywords; checked in a fixed order.
    pub fn detect(cleaned: &str) -> Self {
        let has = |words: &[&str]| words.iter().any(|w| cleaned.contains(w));
        if has(&["creator", "made", "created", "build"]) {
            OwnershipTopic::Creator
        } else if has(&["developer", "develop", "programming"]) {
            OwnershipTopic::Developer
        } else if has(&["owner", "pemilik", "milik"]) {
            OwnershipTopic::Owner
        } else if has(&["team", "tim", "group"]) {
            OwnershipTopic::Team
        } else if has(&["pendiri", "founder", "founded"]) {
            OwnershipTopic::Owner
        } else {
            OwnershipTopic::About
        }
    }
}

/// Builds replies for locally answered categories.
#[derive(Clone)]
pub struct LocalResponder {
    clock: Arc<dyn Clock>,
}

impl LocalResponder {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Greeting reply in the greeting's language.
    pub fn greeting(&self, message: &str, language: Language) -> String {
        let replies = match language {
            Language::Indonesian => GREETINGS_ID,
            Language::English => GREETINGS_EN,
        };
        let idx = string_hash(&normalize(message)) as usize % replies.len();
        replies[idx].to_string()
    }

    /// Time/date reply. `cleaned` is the trimmed, lowercased message.
    ///
    /// `jam` → time of day, `tanggal`/`hari` → full date, `bulan` → month,
    /// `tahun` → year, anything else → full timestamp.
    pub fn time_reply(&self, cleaned: &str) -> String {
        render_time(cleaned, self.clock.now())
    }

    /// Canned long-form answer about who built the assistant.
    pub fn ownership_reply(&self, cleaned: &str) -> String {
        ownership_text(OwnershipTopic::detect(cleaned))
    }

    pub fn help(&self) -> &'static str {
        HELP
    }

    pub fn apology(&self) -> &'static str {
        APOLOGY
    }

    /// Final user-facing text for a locally resolved classification.
    ///
    /// Returns `None` for categories that need the backend.
    pub fn render(&self, classification: &Classification) -> Option<String> {
        if classification.needs_remote {
            return None;
        }
        let text = match (classification.category, &classification.local_result) {
            (Category::Math, Some(result)) => format!("Hasil perhitungan: **{result}**"),
            (_, Some(result)) => result.clone(),
            (_, None) => HELP.to_string(),
        };
        Some(text)
    }
}

impl Default for LocalResponder {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock))
    }
}

fn render_time(cleaned: &str, now: DateTime<FixedOffset>) -> String {
    if cleaned.contains("jam") {
        let hour = now.hour();
        let ampm = if hour >= 12 { "PM" } else { "AM" };
        let display = match hour % 12 {
            0 => 12,
            h => h,
        };
        return format!(
            "Sekarang jam {display}:{:02} {ampm} (Waktu lokal Anda)",
            now.minute()
        );
    }

    if cleaned.contains("tanggal") || cleaned.contains("hari") {
        return format!(
            "Hari {}, {} {} {}",
            DAYS_ID[now.weekday().num_days_from_monday() as usize],
            now.day(),
            MONTHS_ID[now.month0() as usize],
            now.year()
        );
    }

    if cleaned.contains("bulan") {
        return format!(
            "Bulan ini adalah {} {}",
            MONTHS_ID[now.month0() as usize],
            now.year()
        );
    }

    if cleaned.contains("tahun") {
        return format!("Tahun ini adalah {}", now.year());
    }

    format!(
        "Waktu saat ini: {}/{}/{}, {:02}.{:02}.{:02}",
        now.day(),
        now.month(),
        now.year(),
        now.hour(),
        now.minute(),
        now.second()
    )
}

fn ownership_text(topic: OwnershipTopic) -> String {
    match topic {
        OwnershipTopic::Creator => format!(
            "👨‍💻 **TENTANG PEMBUAT AMELIA AI**

**{CREATOR}** adalah creator/pencipta Amelia AI. {CREATOR} adalah:
- 👨‍💼 Founder & Lead Developer Amelia AI
- 🎯 Fokus pada AI & Machine Learning
- 🌟 Inovator teknologi Indonesia
- 💡 Misi: Demokratisasi AI untuk semua orang

{CREATOR} menciptakan Amelia AI dengan visi memberikan akses teknologi AI tercanggih kepada pengguna Indonesia dengan cara yang mudah dan intuitif."
        ),
        OwnershipTopic::Developer => format!(
            "👨‍💻 **TIM PENGEMBANG AMELIA AI**

Amelia AI dikembangkan dan dikelola oleh **{CREATOR}** sebagai lead developer dengan dukungan komunitas open-source.

Semua dikembangkan dengan 💙 oleh {CREATOR}."
        ),
        OwnershipTopic::Owner => format!(
            "👑 **OWNER & FOUNDER**

**{CREATOR}** adalah owner dan founder dari Amelia AI.

Dengan semangat inovasi dan dedikasi untuk teknologi, {CREATOR} membangun Amelia AI sebagai:
- 💬 Asisten AI yang powerful
- 🌍 Dukungan multi-bahasa (termasuk Indonesia)
- 🎨 Interface yang user-friendly
- 🔒 Keamanan data pengguna

Amelia AI adalah produk kebanggaan dari {CREATOR}."
        ),
        OwnershipTopic::Team => format!(
            "👥 **TIM AMELIA AI**

Amelia AI dikembangkan secara primary oleh **{CREATOR}** sebagai founder, lead developer, dan maintainer.

**{CREATOR}** bertanggung jawab atas:
- 🎯 Arsitektur sistem
- 💻 Pengembangan code
- 🐛 Bug fixes & updates
- 📈 Feature improvements

Dengan dukungan komunitas open-source dan user feedback yang aktif, Amelia AI terus berkembang menjadi lebih baik."
        ),
        OwnershipTopic::About => format!(
            "👨‍💻 **TENTANG AMELIA AI**

**Amelia AI** dibuat dan dikembangkan oleh **{CREATOR}** - seorang developer Indonesia yang passionate tentang AI dan teknologi.

**{CREATOR}** memiliki visi untuk membuat teknologi AI accessible bagi semua orang, terutama pengguna Indonesia.

Dibuat dengan 💙 oleh {CREATOR} 🎯"
        ),
    }
}

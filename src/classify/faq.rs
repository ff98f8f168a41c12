//! Canned question → answer table.

/// Creator credit used across canned replies.
pub const CREATOR: &str = "B41M (Ibrahim Yusuf)";

const DEFAULT_ENTRIES: &[(&str, &str)] = &[
    (
        "apa itu ai",
        "AI (Artificial Intelligence) adalah kecerdasan buatan yang memungkinkan komputer dan mesin berpikir seperti manusia. AI dapat belajar, memecahkan masalah, dan membuat keputusan.",
    ),
    (
        "apa itu machine learning",
        "Machine Learning adalah cabang AI yang memungkinkan sistem belajar dari data dan meningkatkan kinerja secara otomatis tanpa diprogram secara eksplisit.",
    ),
    (
        "apa itu deep learning",
        "Deep Learning adalah subset dari Machine Learning yang menggunakan neural network dengan banyak lapisan untuk mempelajari pola kompleks dalam data.",
    ),
    (
        "siapa kamu",
        "Saya Amelia AI, asisten virtual yang dibuat oleh B41M (Ibrahim Yusuf). Saya menggunakan teknologi AI terkini untuk membantu menjawab pertanyaan Anda.",
    ),
    (
        "siapa yang membuat kamu",
        "Saya Amelia AI dibuat oleh **B41M (Ibrahim Yusuf)** - seorang developer Indonesia yang passion dalam teknologi AI dan pengembangan aplikasi cerdas. B41M (Ibrahim Yusuf) menciptakan saya untuk memberikan pengalaman AI yang powerful dan mudah digunakan.",
    ),
    (
        "siapa creator kamu",
        "**B41M (Ibrahim Yusuf)** adalah creator/pencipta Amelia AI. B41M (Ibrahim Yusuf) adalah inovator teknologi yang fokus pada pengembangan AI solutions untuk pengguna Indonesia. Dengan visi membuat AI accessible untuk semua orang, B41M (Ibrahim Yusuf) membangun Amelia AI dengan berbagai fitur canggih.",
    ),
    (
        "siapa developer kamu",
        "Amelia AI dikembangkan oleh **B41M (Ibrahim Yusuf)** - seorang full-stack developer dengan keahlian di bidang AI, Machine Learning, dan Web Development. B41M (Ibrahim Yusuf) bertanggung jawab atas seluruh pengembangan, maintenance, dan improvement Amelia AI.",
    ),
    (
        "siapa owner",
        "**B41M (Ibrahim Yusuf)** adalah owner dan founder dari Amelia AI. B41M (Ibrahim Yusuf) memiliki dan mengelola Amelia AI dengan misi untuk democratize akses terhadap teknologi AI bagi pengguna Indonesia.",
    ),
    (
        "siapa pendiri",
        "**B41M (Ibrahim Yusuf)** adalah founder dan pendiri Amelia AI. Dengan latar belakang di bidang teknologi, B41M (Ibrahim Yusuf) mendirikan Amelia AI untuk memberikan solusi AI yang powerful, mudah diakses, dan bermanfaat bagi masyarakat.",
    ),
    (
        "siapa team",
        "Amelia AI dikembangkan dan dikelola oleh **B41M (Ibrahim Yusuf)** sebagai founder dan lead developer. B41M (Ibrahim Yusuf) bekerja sama dengan komunitas open-source dan memanfaatkan berbagai teknologi AI.",
    ),
    (
        "what is ai",
        "AI (Artificial Intelligence) refers to the simulation of human intelligence in machines programmed to think and learn like humans.",
    ),
    (
        "how to learn coding",
        "Untuk belajar coding: 1) Pilih bahasa pemrograman (Python bagus untuk pemula), 2) Praktekkan setiap hari, 3) Buat proyek kecil, 4) Bergabung dengan komunitas, 5) Jangan takut membuat kesalahan.",
    ),
    (
        "apa kabar",
        "Saya baik! Terima kasih sudah bertanya. Saya siap membantu Anda dengan pertanyaan atau tugas apa pun. Bagaimana dengan Anda?",
    ),
];

/// Ordered FAQ table.
///
/// Lookup tries an exact key match first, then a bidirectional substring
/// match in insertion order; the first substring hit wins, with no ranking.
#[derive(Debug, Clone)]
pub struct FaqTable {
    entries: Vec<(String, String)>,
}

impl FaqTable {
    /// An empty table.
    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Build a table from `(question, answer)` pairs, keeping their order.
    ///
    /// Questions are stored trimmed and lowercased.
    pub fn from_pairs<I, Q, A>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (Q, A)>,
        Q: Into<String>,
        A: Into<String>,
    {
        let mut table = Self::empty();
        for (q, a) in pairs {
            table.insert(q, a);
        }
        table
    }

    /// Append an entry, or replace the answer of an existing question in place.
    pub fn insert(&mut self, question: impl Into<String>, answer: impl Into<String>) {
        let question = question.into().trim().to_lowercase();
        let answer = answer.into();
        match self.entries.iter_mut().find(|(q, _)| *q == question) {
            Some(entry) => entry.1 = answer,
            None => self.entries.push((question, answer)),
        }
    }

    /// Look up an answer for an already trimmed, lowercased message.
    pub fn lookup(&self, cleaned: &str) -> Option<&str> {
        if cleaned.is_empty() {
            return None;
        }
        if let Some((_, answer)) = self.entries.iter().find(|(q, _)| q == cleaned) {
            return Some(answer);
        }

        self.entries
            .iter()
            .find(|(q, _)| cleaned.contains(q.as_str()) || q.contains(cleaned))
            .map(|(_, answer)| answer.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for FaqTable {
    fn default() -> Self {
        Self::from_pairs(DEFAULT_ENTRIES.iter().copied())
    }
}

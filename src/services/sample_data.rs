//! Embedded fallback dataset, used when neither the network nor the offline cache
//! can provide posts.

use crate::services::normalizer::{normalize_all, parse_dataset, NormalizeOptions};
use crate::types::post::Post;

/// Raw sample dataset in the same shape the network source serves.
pub const SAMPLE_DATASET: &str = r#"{
  "posts": [
    {
      "id": 1,
      "title": "Quantum Computing: The End of Encryption as We Know It?",
      "excerpt": "Shor's algorithm threatens RSA and elliptic-curve cryptography. Here is what post-quantum migration looks like in practice.",
      "content": "Large fault-tolerant quantum computers would break the public-key schemes that secure most of today's traffic. Shor's algorithm factors integers in polynomial time, which makes RSA and elliptic-curve keys recoverable. Standards bodies have already selected lattice-based replacements, and the migration work starts with an inventory of where keys live, how long data must stay secret, and which protocols can negotiate hybrid key exchange today.",
      "author": {"name": "Dr. Maya Chen", "avatar": "/images/authors/maya.jpg", "bio": "Cryptography researcher"},
      "category": "technology",
      "tags": ["quantum", "security", "cryptography"],
      "publishedAt": "2024-03-12T09:00:00Z",
      "views": 1840,
      "likes": 212,
      "comments": 37,
      "shares": 64,
      "featured": true
    },
    {
      "id": 2,
      "title": "The Future of Web Development: Trends to Watch",
      "excerpt": "Edge rendering, WebAssembly and AI-assisted tooling are reshaping how sites get built.",
      "content": "Frameworks keep moving work to the edge, WebAssembly brings near-native speed to the browser, and build tools are getting faster every release. Some speculate that quantum hardware will one day change how we think about compilation, but the near-term wins are in caching, streaming and smaller bundles.",
      "author": "Alex Rivera",
      "category": "technology",
      "tags": ["web", "javascript", "webassembly"],
      "date": "2024-02-28",
      "views": 3120,
      "likes": 188,
      "comments": 22,
      "shares": 41
    },
    {
      "id": 3,
      "title": "Designing for Accessibility from Day One",
      "excerpt": "Accessible design is good design. Practical patterns for contrast, focus and semantics.",
      "content": "Start with semantic HTML, keep focus visible, respect reduced-motion preferences and test with a screen reader before launch. Retrofitting accessibility costs far more than building it in.",
      "author": {"name": "Priya Natarajan"},
      "category": "design",
      "tags": ["accessibility", "ux", "css"],
      "publishedAt": "2024-01-19T14:30:00Z",
      "views": 960,
      "likes": 143,
      "comments": 18,
      "shares": 29
    },
    {
      "id": 4,
      "title": "A Minimalist's Guide to Remote Work",
      "excerpt": "Fewer tools, clearer rituals and a desk you actually want to sit at.",
      "content": "Remote work rewards routines. Pick one chat tool, one document tool and one calendar, write decisions down and protect deep-work blocks.",
      "author": "Jordan Blake",
      "category": "lifestyle",
      "tags": ["productivity", "remote-work"],
      "date": "2023-12-05",
      "views": 1275,
      "likes": 97,
      "comments": 11,
      "shares": 15
    },
    {
      "id": 5,
      "title": "Color Theory for Interface Designers",
      "excerpt": "How hue, saturation and contrast guide attention on a screen.",
      "content": "A restrained palette with one accent color directs the eye. Check contrast ratios for text, test palettes against common color-vision deficiencies, and let neutrals carry most of the interface.",
      "author": {"name": "Priya Natarajan"},
      "category": "design",
      "tags": ["color", "ux"],
      "publishedAt": "2023-11-22T08:15:00Z",
      "views": 720,
      "likes": 66,
      "comments": 9,
      "shares": 12
    },
    {
      "id": 6,
      "title": "Building Offline-First Web Apps",
      "excerpt": "Service workers, cache strategies and local storage done right.",
      "content": "Offline-first apps treat the network as an enhancement. Cache the shell, fall back to the last good copy of your data, and sync user actions when connectivity returns.",
      "author": "Alex Rivera",
      "category": "technology",
      "tags": ["web", "pwa", "offline"],
      "date": "2023-10-30",
      "views": 2045,
      "likes": 174,
      "comments": 26,
      "shares": 38
    }
  ]
}"#;

/// Normalized sample posts.
pub fn sample_posts(options: NormalizeOptions) -> Vec<Post> {
    parse_dataset(SAMPLE_DATASET)
        .and_then(|records| normalize_all(&records, options))
        .map(|batch| batch.posts)
        .unwrap_or_else(|err| {
            tracing::error!(%err, "embedded sample dataset is invalid");
            Vec::new()
        })
}

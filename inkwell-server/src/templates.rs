/// Ready-made prompts a client can ask for by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptTemplate {
    Ecommerce,
    ProductCard,
    Dashboard,
}

pub const DEFAULT_BRAND: &str = "Your Brand";

impl PromptTemplate {
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "ecommerce" => Some(PromptTemplate::Ecommerce),
            "productCard" => Some(PromptTemplate::ProductCard),
            "dashboard" => Some(PromptTemplate::Dashboard),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            PromptTemplate::Ecommerce => "ecommerce",
            PromptTemplate::ProductCard => "productCard",
            PromptTemplate::Dashboard => "dashboard",
        }
    }

    /// Expands the template. Only `ecommerce` uses the brand.
    pub fn prompt(self, brand: Option<&str>) -> String {
        match self {
            PromptTemplate::Ecommerce => {
                let brand = brand.map(str::trim).filter(|b| !b.is_empty()).unwrap_or(DEFAULT_BRAND);
                let headline = format!("Build a professional e-commerce landing page for {}.", brand);
                [
                    headline.as_str(),
                    "Sections:",
                    "- Sticky header with logo and nav (Home, Shop, About, Contact)",
                    "- Hero with headline, subcopy, CTAs",
                    "- Product grid (6 items) with image, name, price, and Add to Cart",
                    "- Benefits (3 columns) with icons",
                    "- Testimonials (2 cards)",
                    "- Footer with links and copyright",
                    "Constraints:",
                    "- Output ONLY HTML + Tailwind (no markdown, no prose)",
                    "- Semantic HTML, responsive (sm/md/lg)",
                    "- No external URLs; if image not provided, use /images/[name]",
                ]
                .join("\n")
            }
            PromptTemplate::ProductCard => [
                "Create a modern product card component with Tailwind.",
                "Includes: image, product name, short description, price, primary CTA",
                "Constraints: output only HTML, semantic markup, hover/focus-visible states",
            ]
            .join("\n"),
            PromptTemplate::Dashboard => [
                "Generate a clean dashboard layout with a sidebar, header, and main content area.",
                "Include: stats cards (4), recent activity list, and a simple table",
                "Constraints: output only HTML + Tailwind, responsive, keyboard-accessible",
            ]
            .join("\n"),
        }
    }
}

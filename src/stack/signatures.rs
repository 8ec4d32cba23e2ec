//! Static detection tables for the tech-stack detector.
//!
//! Adding a language, framework or tool is a table edit; the detector never
//! branches on specific names.

/// A detectable technology and the path fragments that characterize it.
///
/// A pattern starting with `*` matches as a suffix (`*.csproj`); any other
/// pattern matches as a case-insensitive substring of the path.
#[derive(Debug, Clone, Copy)]
pub struct Signature {
    pub name: &'static str,
    pub patterns: &'static [&'static str],
}

/// Lowercase file extension to language name.
pub const LANGUAGES: &[(&str, &str)] = &[
    ("js", "JavaScript"),
    ("ts", "TypeScript"),
    ("jsx", "React"),
    ("tsx", "React TypeScript"),
    ("py", "Python"),
    ("java", "Java"),
    ("go", "Go"),
    ("rs", "Rust"),
    ("cs", "C#"),
    ("php", "PHP"),
    ("rb", "Ruby"),
    ("cpp", "C++"),
    ("c", "C"),
    ("swift", "Swift"),
    ("kt", "Kotlin"),
    ("scala", "Scala"),
    ("clj", "Clojure"),
    ("hs", "Haskell"),
];

pub const FRAMEWORKS: &[Signature] = &[
    Signature {
        name: "react",
        patterns: &["package.json", "src/", "public/", "build/", "node_modules/"],
    },
    Signature {
        name: "vue",
        patterns: &["package.json", "src/", "public/", "dist/", "vue.config.js"],
    },
    Signature {
        name: "angular",
        patterns: &["package.json", "src/", "angular.json", "dist/"],
    },
    Signature {
        name: "django",
        patterns: &["manage.py", "requirements.txt", "settings.py", "wsgi.py"],
    },
    Signature {
        name: "flask",
        patterns: &["app.py", "requirements.txt", "wsgi.py"],
    },
    Signature {
        name: "fastapi",
        patterns: &["main.py", "requirements.txt", "app/", "routers/"],
    },
    Signature {
        name: "spring",
        patterns: &["pom.xml", "src/main/java/", "application.properties"],
    },
    Signature {
        name: "express",
        patterns: &["package.json", "server.js", "app.js", "routes/"],
    },
    Signature {
        name: "nextjs",
        patterns: &["package.json", "next.config.js", "pages/", "app/"],
    },
    Signature {
        name: "nuxt",
        patterns: &["package.json", "nuxt.config.js", "pages/", "components/"],
    },
    Signature {
        name: "go",
        patterns: &["go.mod", "main.go", "cmd/", "pkg/"],
    },
    Signature {
        name: "rust",
        patterns: &["cargo.toml", "src/", "target/"],
    },
    Signature {
        name: "dotnet",
        patterns: &["*.csproj", "*.sln", "program.cs"],
    },
    Signature {
        name: "laravel",
        patterns: &["composer.json", "artisan", "app/", "routes/"],
    },
    Signature {
        name: "rails",
        patterns: &["gemfile", "config.ru", "app/", "config/"],
    },
    Signature {
        name: "docker",
        patterns: &["dockerfile", "docker-compose.yml", ".dockerignore"],
    },
];

pub const TOOLS: &[Signature] = &[
    Signature {
        name: "docker",
        patterns: &["dockerfile", "docker-compose"],
    },
    Signature {
        name: "kubernetes",
        patterns: &["deployment.yaml", "service.yaml", "ingress.yaml"],
    },
    Signature {
        name: "terraform",
        patterns: &["main.tf", "variables.tf", "outputs.tf"],
    },
    Signature {
        name: "ansible",
        patterns: &["playbook.yml", "inventory"],
    },
    Signature {
        name: "jenkins",
        patterns: &["jenkinsfile", "jenkins"],
    },
    Signature {
        name: "github-actions",
        patterns: &[".github/workflows"],
    },
    Signature {
        name: "gitlab-ci",
        patterns: &[".gitlab-ci.yml"],
    },
    Signature {
        name: "pytest",
        patterns: &["test_", "pytest.ini"],
    },
    Signature {
        name: "jest",
        patterns: &["jest.config", "__tests__"],
    },
    Signature {
        name: "mysql",
        patterns: &["mysql", "my.cnf"],
    },
    Signature {
        name: "postgresql",
        patterns: &["postgresql", "postgres"],
    },
    Signature {
        name: "redis",
        patterns: &["redis.conf", "redis"],
    },
    Signature {
        name: "mongodb",
        patterns: &["mongo", "mongodb"],
    },
];

pub const DEPLOYMENT_TOOLS: &str = "deployment_tools";
pub const TESTING_FRAMEWORKS: &str = "testing_frameworks";
pub const BUILD_TOOLS: &str = "build_tools";
pub const DATABASES: &str = "databases";

/// Every category, in report order.
pub const CATEGORIES: [&str; 4] = [DEPLOYMENT_TOOLS, TESTING_FRAMEWORKS, BUILD_TOOLS, DATABASES];

/// Tool name to category; unlisted tools default to deployment tools.
pub const TOOL_CATEGORIES: &[(&str, &str)] = &[
    ("docker", DEPLOYMENT_TOOLS),
    ("kubernetes", DEPLOYMENT_TOOLS),
    ("terraform", DEPLOYMENT_TOOLS),
    ("ansible", DEPLOYMENT_TOOLS),
    ("pytest", TESTING_FRAMEWORKS),
    ("jest", TESTING_FRAMEWORKS),
    ("mocha", TESTING_FRAMEWORKS),
    ("junit", TESTING_FRAMEWORKS),
    ("webpack", BUILD_TOOLS),
    ("vite", BUILD_TOOLS),
    ("gulp", BUILD_TOOLS),
    ("grunt", BUILD_TOOLS),
    ("maven", BUILD_TOOLS),
    ("gradle", BUILD_TOOLS),
    ("mysql", DATABASES),
    ("postgresql", DATABASES),
    ("redis", DATABASES),
    ("mongodb", DATABASES),
    ("sqlite", DATABASES),
];

pub fn category_of(tool: &str) -> &'static str {
    TOOL_CATEGORIES
        .iter()
        .find(|(name, _)| *name == tool)
        .map_or(DEPLOYMENT_TOOLS, |(_, category)| category)
}

/// Language name to the ecosystem whose build steps apply.
pub const LANGUAGE_ECOSYSTEMS: &[(&str, &str)] = &[
    ("javascript", "node"),
    ("typescript", "node"),
    ("python", "python"),
    ("java", "java"),
];

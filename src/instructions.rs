use std::io::{self, Write};

const RULE_WIDTH: usize = 60;

struct Service {
    name: &'static str,
    steps: &'static [&'static str],
}

const SERVICES: [Service; 4] = [
    Service {
        name: "🗄️  MongoDB Atlas",
        steps: &[
            "Go to: https://www.mongodb.com/cloud/atlas",
            "Create free cluster",
            "Create database user",
            "Get connection string",
        ],
    },
    Service {
        name: "🔐 Google OAuth",
        steps: &[
            "Go to: https://console.cloud.google.com/",
            "Create OAuth 2.0 credentials",
            "Get Client ID and Secret",
        ],
    },
    Service {
        name: "📧 Gmail App Password",
        steps: &["Enable 2FA on Gmail", "Generate App Password"],
    },
    Service {
        name: "🤖 Groq API",
        steps: &["Go to: https://groq.com/", "Get API key"],
    },
];

const NEXT_STEPS: [&str; 3] = [
    "Set up the external services above",
    "Create .env files using the templates",
    "Upload to EC2 and run deployment script",
];

const DEPLOY_COMMANDS: [&str; 3] = [
    "scp -r -i 'keypair.pem' . ubuntu@EC2_IP:/opt/hireiq/",
    "ssh -i 'keypair.pem' ubuntu@EC2_IP",
    "cd /opt/hireiq && ./deployment/deploy.sh",
];

pub fn write_secret_line(out: &mut impl Write, secret: &str) -> io::Result<()> {
    writeln!(out, "SECRET_KEY={secret}")
}

/// Writes the deployment checklist with `secret` as the generated key.
pub fn write_instructions(out: &mut impl Write, secret: &str) -> io::Result<()> {
    let rule = "=".repeat(RULE_WIDTH);
    writeln!(out, "{rule}")?;
    writeln!(out, "   HireIQ Environment Configuration Helper")?;
    writeln!(out, "{rule}")?;
    writeln!(out)?;

    writeln!(out, "🔑 Generated Django Secret Key:")?;
    write_secret_line(out, secret)?;
    writeln!(out)?;

    writeln!(out, "📋 Required External Services Setup:")?;
    writeln!(out)?;
    for (i, service) in SERVICES.iter().enumerate() {
        writeln!(out, "{}. {}:", i + 1, service.name)?;
        for step in service.steps {
            writeln!(out, "   • {step}")?;
        }
        writeln!(out)?;
    }

    writeln!(out, "📝 Next Steps:")?;
    for (i, step) in NEXT_STEPS.iter().enumerate() {
        writeln!(out, "   {}. {step}", i + 1)?;
    }
    writeln!(out)?;

    writeln!(out, "🚀 Deployment Commands:")?;
    for cmd in DEPLOY_COMMANDS {
        writeln!(out, "   {cmd}")?;
    }
    writeln!(out)?;

    out.flush()
}

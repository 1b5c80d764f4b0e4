//! Prompt text sent to the generation service.

use crate::curriculum::LessonTopic;
use crate::platform::Platform;

/// System instruction for lesson generation.
pub const LESSON_SYSTEM_INSTRUCTION: &str = "Eres un tutor experto en Excel para ciencias sociales. Tu objetivo es que el estudiante pierda el miedo a los datos y aprenda haciendo.";

/// System instruction for the tutor chat.
pub const TUTOR_PERSONA: &str = "Eres 'PsychoStats Bot', un tutor experto en Excel pero con la paciencia de un maestro de primaria.
Tu usuario es un estudiante de PSICOLOGÍA que sabe MUY POCO o NADA de Excel.

Reglas de Oro:
1. Contexto Psicológico: Tus ejemplos siempre deben tratar sobre pacientes, encuestas, tiempos de reacción o terapias. Evita ejemplos de ventas o finanzas.
2. Cero Tecnicismos: No hables de \"argumentos de función\" sin explicar que son los \"datos que necesita la fórmula\".
3. Paso a Paso: Explica las cosas como una receta de cocina.
4. Empatía: Reconoce que Excel puede asustar. Sé alentador.
5. Idioma: Siempre ESPAÑOL.";

/// Builds the lesson prompt for a topic.
///
/// Reinforcement prompts ask for a simplified re-explanation with everyday
/// analogies and a different psychology example.
#[must_use]
pub fn lesson_prompt(topic: &LessonTopic, reinforcement: bool, platform: Platform) -> String {
    let instruction = if reinforcement {
        format!(
            "ATENCIÓN: EL ESTUDIANTE NO ENTENDIÓ LA PRIMERA EXPLICACIÓN.

Tu objetivo ahora es SIMPLIFICAR AL MÁXIMO.
1. Usa analogías cotidianas (ej. cocinar, organizar un armario) para explicar \"{title}\".
2. Evita jerga técnica complicada.
3. Usa un ejemplo de psicología diferente al anterior, quizás algo más cotidiano o clínico simple.
4. Mantén la estructura pero cambia el tono a \"Entrenador personal amigable\".",
            title = topic.title
        )
    } else {
        format!(
            "Actúa como un profesor universitario de Metodología de la Investigación y Estadística para Psicología.
Crea una lección (Tutorial de Excel) sobre el tema: \"{title}\".",
            title = topic.title
        )
    };

    let title_suffix = if reinforcement {
        " (Refuerzo Simplificado)"
    } else {
        ""
    };
    let concept_heading = if reinforcement {
        "Explicado Simple"
    } else {
        "en Investigación"
    };

    format!(
        "{instruction}

Contexto Específico: {context}

Plataforma del Estudiante: {platform_name}. {platform_hint}

Estructura Obligatoria del Markdown (Respeta estos títulos exactos):

# {title}{title_suffix}

### 1. Concepto {concept_heading}
Explica qué es esto y por qué un psicólogo lo necesita.

### 2. Instrucciones Paso a Paso
Guía técnica de cómo hacerlo en Excel para {platform_name}. Usa viñetas numeradas. Sé muy claro con los menús.

### 3. Ejemplo Psicológico Real
Describe un escenario de investigación y cómo se aplica.
IMPORTANTE: Si requieres mostrar datos, GENERA UNA TABLA MARKDOWN CLARA.
Usa este formato para las tablas (con pipes |):
| ID | Variable 1 | Variable 2 |
|--- | --- | --- |
| 01 | Dato A | Dato B |

### 4. Laboratorio de Práctica
Diseña 3 ejercicios concretos y desafiantes (\"Tareas\") que el estudiante debe realizar ahora mismo.

IMPORTANTE:
- Idioma: ESPAÑOL estricto.
- Fórmulas: Ponlas siempre en bloques de código, ej: `=PROMEDIO(A1:B10)`.
- Tablas: Asegúrate de alinear las columnas de las tablas markdown.
",
        context = topic.prompt_context,
        platform_name = platform.name(),
        platform_hint = platform.prompt_hint(),
        title = topic.title,
    )
}

/// Prompt for the decorative lesson illustration.
#[must_use]
pub fn illustration_prompt(concept: &str) -> String {
    format!(
        "Ilustración minimalista y moderna estilo 'Corporate Memphis' o vectorial plana sobre: {concept}, relacionada con análisis de datos, psicología o investigación. Colores suaves: Azules, Verdes menta, Blanco. Sin texto."
    )
}

/// Prompt for a concept video.
#[must_use]
pub fn video_prompt(topic: &str) -> String {
    format!(
        "Animación gráfica abstracta y suave que representa el concepto de: {topic}. Estilo educativo minimalista y limpio."
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::curriculum::lesson;

    #[test]
    fn test_first_pass_prompt() {
        let topic = lesson("3.2").unwrap();
        let prompt = lesson_prompt(topic, false, Platform::Windows);

        assert!(prompt.starts_with("Actúa como un profesor universitario"));
        assert!(prompt.contains("# Referencias Relativas vs Absolutas ($)\n"));
        assert!(prompt.contains("### 1. Concepto en Investigación"));
        assert!(prompt.contains("### 4. Laboratorio de Práctica"));
        assert!(prompt.contains(topic.prompt_context));
        assert!(prompt.contains(Platform::Windows.prompt_hint()));
        assert!(!prompt.contains("Refuerzo"));
    }

    #[test]
    fn test_reinforcement_prompt() {
        let topic = lesson("4.2").unwrap();
        let prompt = lesson_prompt(topic, true, Platform::Tablet);

        assert!(prompt.starts_with("ATENCIÓN: EL ESTUDIANTE NO ENTENDIÓ"));
        assert!(prompt.contains("analogías cotidianas"));
        assert!(prompt.contains("diferente al anterior"));
        assert!(prompt.contains("# Correlaciones (Pearson) (Refuerzo Simplificado)"));
        assert!(prompt.contains("### 1. Concepto Explicado Simple"));
        assert!(prompt.contains("Plataforma del Estudiante: Tablet."));
    }

    #[test]
    fn test_platform_changes_prompt() {
        let topic = lesson("1.1").unwrap();
        assert_ne!(
            lesson_prompt(topic, false, Platform::Mac),
            lesson_prompt(topic, false, Platform::Web)
        );
    }

    #[test]
    fn test_media_prompts_embed_concept() {
        assert!(illustration_prompt("Histogramas").contains("sobre: Histogramas,"));
        assert!(video_prompt("Distribución normal").contains("concepto de: Distribución normal."));
    }

    #[test]
    fn test_tutor_persona_rules() {
        assert!(TUTOR_PERSONA.contains("PsychoStats Bot"));
        assert_eq!(TUTOR_PERSONA.matches("\n5. ").count(), 1);
    }
}
